use serde::{Deserialize, Serialize};
use std::fmt;

use super::definition::LocalizedText;
use crate::registry::DataType;

/// Widget class of a filter or report parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Text,
    Select,
    Multiselect,
    Date,
    DateRange,
    Number,
    NumberRange,
    Boolean,
}

impl FilterType {
    /// Select widgets need somewhere to get their options from.
    pub fn needs_options(self) -> bool {
        matches!(self, FilterType::Select | FilterType::Multiselect)
    }
}

/// Comparison operator a filter applies to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    DateEquals,
    DateBefore,
    DateAfter,
    DateBetween,
}

impl Operator {
    /// Operators taking a two-element `[low, high]` operand.
    pub fn is_range(self) -> bool {
        matches!(self, Operator::Between | Operator::DateBetween)
    }

    /// Operators taking a list operand.
    pub fn is_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Operators that ignore any supplied operand.
    pub fn is_presence(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::DateEquals => "date_equals",
            Operator::DateBefore => "date_before",
            Operator::DateAfter => "date_after",
            Operator::DateBetween => "date_between",
        };
        write!(f, "{}", name)
    }
}

/// One static option of a select/multiselect filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: serde_json::Value,
    pub labels: LocalizedText,
}

/// Descriptor of a dynamic option source, `table:value_field,label_field`.
///
/// The collaborator that owns the data access layer resolves it; the engine
/// only validates the shape at authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsSource {
    pub table: String,
    pub value_field: String,
    pub label_field: String,
}

impl OptionsSource {
    /// Parses `table:value_field,label_field`. The label field defaults to
    /// the value field when omitted.
    pub fn parse(descriptor: &str) -> Result<Self, String> {
        let (table, fields) = descriptor
            .split_once(':')
            .ok_or_else(|| format!("option source '{}' is missing ':'", descriptor))?;
        if table.is_empty() {
            return Err(format!("option source '{}' has an empty table", descriptor));
        }
        let (value_field, label_field) = match fields.split_once(',') {
            Some((value, label)) => (value, label),
            None => (fields, fields),
        };
        if value_field.is_empty() || label_field.is_empty() {
            return Err(format!("option source '{}' has empty fields", descriptor));
        }
        Ok(Self {
            table: table.to_string(),
            value_field: value_field.to_string(),
            label_field: label_field.to_string(),
        })
    }
}

/// One filter of a table definition or parameter of a report definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Stable key, unique within the parent definition. Request filter
    /// values are keyed by it.
    pub key: String,
    /// Underlying source field the compiled condition constrains.
    pub field_name: String,
    pub data_type: DataType,
    pub filter_type: FilterType,
    pub operator: Operator,
    pub labels: LocalizedText,
    #[serde(default)]
    pub placeholder: Option<LocalizedText>,
    #[serde(default)]
    pub options: Vec<FilterOption>,
    #[serde(default)]
    pub options_source: Option<OptionsSource>,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}

impl FilterSpec {
    pub fn new(
        key: impl Into<String>,
        field_name: impl Into<String>,
        data_type: DataType,
        filter_type: FilterType,
        operator: Operator,
        labels: LocalizedText,
    ) -> Self {
        Self {
            key: key.into(),
            field_name: field_name.into(),
            data_type,
            filter_type,
            operator,
            labels,
            placeholder: None,
            options: Vec::new(),
            options_source: None,
            default_value: None,
            is_required: false,
            is_visible: true,
            sort_order: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_option_source() {
        let source = OptionsSource::parse("programs:id,name_en").unwrap();
        assert_eq!(source.table, "programs");
        assert_eq!(source.value_field, "id");
        assert_eq!(source.label_field, "name_en");
    }

    #[test]
    fn label_field_defaults_to_value_field() {
        let source = OptionsSource::parse("departments:code").unwrap();
        assert_eq!(source.value_field, "code");
        assert_eq!(source.label_field, "code");
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(OptionsSource::parse("programs").is_err());
        assert!(OptionsSource::parse(":id,name").is_err());
        assert!(OptionsSource::parse("programs:").is_err());
    }
}
