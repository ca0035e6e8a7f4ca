//! Field/column type registry.
//!
//! Maps each declared [`DataType`] to its value validator, default formatter
//! and the set of comparison operators that are semantically valid for it.
//! The filter compiler and the authoring validator both consult this registry,
//! so operator validity is enforced once, centrally.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::render::format;
use crate::schema::types::{Lang, Operator};

/// Closed set of declarable data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Decimal,
    Currency,
    Percentage,
    Date,
    Datetime,
    Time,
    Boolean,
    Status,
    Image,
    Link,
    Email,
    Phone,
    Json,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Number | DataType::Decimal | DataType::Currency | DataType::Percentage
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::Datetime | DataType::Time)
    }

    pub const ALL: [DataType; 15] = [
        DataType::Text,
        DataType::Number,
        DataType::Decimal,
        DataType::Currency,
        DataType::Percentage,
        DataType::Date,
        DataType::Datetime,
        DataType::Time,
        DataType::Boolean,
        DataType::Status,
        DataType::Image,
        DataType::Link,
        DataType::Email,
        DataType::Phone,
        DataType::Json,
    ];
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Decimal => "decimal",
            DataType::Currency => "currency",
            DataType::Percentage => "percentage",
            DataType::Date => "date",
            DataType::Datetime => "datetime",
            DataType::Time => "time",
            DataType::Boolean => "boolean",
            DataType::Status => "status",
            DataType::Image => "image",
            DataType::Link => "link",
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DataType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| EngineError::UnknownType {
                name: s.to_string(),
            })
    }
}

/// What the registry knows about one data type.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub data_type: DataType,
    /// Operators a filter on this type may declare.
    pub allowed_operators: &'static [Operator],
    /// Shape check for a single scalar operand of this type.
    pub validate: fn(&Value) -> bool,
    /// Default formatter; spec-level `format_options` override its defaults.
    pub format: fn(&Value, &HashMap<String, String>, Lang) -> String,
}

impl TypeDescriptor {
    pub fn allows_operator(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::Contains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
];

const NUMERIC_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::Between,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
];

const TEMPORAL_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::DateEquals,
    Operator::DateBefore,
    Operator::DateAfter,
    Operator::DateBetween,
    Operator::IsNull,
    Operator::IsNotNull,
];

const BOOLEAN_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::IsNull,
    Operator::IsNotNull,
];

const STATUS_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
];

const JSON_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::IsNull,
    Operator::IsNotNull,
];

fn validate_string(value: &Value) -> bool {
    value.is_string()
}

fn validate_number(value: &Value) -> bool {
    value.is_number()
}

fn validate_boolean(value: &Value) -> bool {
    value.is_boolean()
}

fn validate_date(value: &Value) -> bool {
    value.as_str().map(|s| parse_date(s).is_some()).unwrap_or(false)
}

fn validate_time(value: &Value) -> bool {
    value.as_str().map(|s| parse_time(s).is_some()).unwrap_or(false)
}

fn validate_any(_value: &Value) -> bool {
    true
}

static REGISTRY: Lazy<HashMap<DataType, TypeDescriptor>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for data_type in DataType::ALL {
        let descriptor = match data_type {
            DataType::Text | DataType::Email | DataType::Phone | DataType::Link
            | DataType::Image => TypeDescriptor {
                data_type,
                allowed_operators: TEXT_OPERATORS,
                validate: validate_string,
                format: format::format_text,
            },
            DataType::Number => TypeDescriptor {
                data_type,
                allowed_operators: NUMERIC_OPERATORS,
                validate: validate_number,
                format: format::format_number,
            },
            DataType::Decimal => TypeDescriptor {
                data_type,
                allowed_operators: NUMERIC_OPERATORS,
                validate: validate_number,
                format: format::format_decimal,
            },
            DataType::Currency => TypeDescriptor {
                data_type,
                allowed_operators: NUMERIC_OPERATORS,
                validate: validate_number,
                format: format::format_currency,
            },
            DataType::Percentage => TypeDescriptor {
                data_type,
                allowed_operators: NUMERIC_OPERATORS,
                validate: validate_number,
                format: format::format_percentage,
            },
            DataType::Date => TypeDescriptor {
                data_type,
                allowed_operators: TEMPORAL_OPERATORS,
                validate: validate_date,
                format: format::format_date,
            },
            DataType::Datetime => TypeDescriptor {
                data_type,
                allowed_operators: TEMPORAL_OPERATORS,
                validate: validate_date,
                format: format::format_datetime,
            },
            DataType::Time => TypeDescriptor {
                data_type,
                allowed_operators: TEMPORAL_OPERATORS,
                validate: validate_time,
                format: format::format_time,
            },
            DataType::Boolean => TypeDescriptor {
                data_type,
                allowed_operators: BOOLEAN_OPERATORS,
                validate: validate_boolean,
                format: format::format_boolean,
            },
            DataType::Status => TypeDescriptor {
                data_type,
                allowed_operators: STATUS_OPERATORS,
                validate: validate_string,
                format: format::format_text,
            },
            DataType::Json => TypeDescriptor {
                data_type,
                allowed_operators: JSON_OPERATORS,
                validate: validate_any,
                format: format::format_json,
            },
        };
        map.insert(data_type, descriptor);
    }
    map
});

/// Looks up the descriptor for a data type. Total over the closed enum.
pub fn describe(data_type: DataType) -> &'static TypeDescriptor {
    // Every variant is inserted at registry construction.
    &REGISTRY[&data_type]
}

/// Looks up a descriptor by its declared type string, failing with
/// `UnknownType` for anything unregistered. Definitions arriving from
/// external authoring surfaces go through this at save time.
pub fn describe_name(name: &str) -> EngineResult<&'static TypeDescriptor> {
    let data_type = DataType::from_str(name)?;
    Ok(describe(data_type))
}

/// Parses a date operand. Accepts plain dates, `Y-m-d H:M:S` timestamps and
/// RFC 3339; only the date part is kept.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(datetime.date_naive());
    }
    None
}

pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Some(datetime);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(datetime.naive_local());
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_type_is_registered() {
        for data_type in DataType::ALL {
            let descriptor = describe(data_type);
            assert_eq!(descriptor.data_type, data_type);
            assert!(!descriptor.allowed_operators.is_empty());
        }
    }

    #[test]
    fn unknown_type_string_is_rejected() {
        let err = describe_name("geolocation").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownType {
                name: "geolocation".to_string()
            }
        );
    }

    #[test]
    fn contains_is_invalid_for_boolean_and_date() {
        assert!(!describe(DataType::Boolean).allows_operator(Operator::Contains));
        assert!(!describe(DataType::Date).allows_operator(Operator::Contains));
        assert!(describe(DataType::Text).allows_operator(Operator::Contains));
    }

    #[test]
    fn date_validator_accepts_common_shapes() {
        let descriptor = describe(DataType::Date);
        assert!((descriptor.validate)(&json!("2024-01-15")));
        assert!((descriptor.validate)(&json!("2024-01-15 10:30:00")));
        assert!(!(descriptor.validate)(&json!("yesterday")));
        assert!(!(descriptor.validate)(&json!(42)));
    }

    #[test]
    fn datetime_round_trips_through_serde_as_datetime() {
        let json = serde_json::to_string(&DataType::Datetime).unwrap();
        assert_eq!(json, "\"datetime\"");
        let back: DataType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DataType::Datetime);
    }
}
