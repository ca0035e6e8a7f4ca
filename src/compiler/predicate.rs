use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::parse_date;
use crate::source::{resolve_path, Row};

/// One compiled, bound query condition.
///
/// Operands are carried as typed values next to the field they constrain;
/// a data-source backend walks these and binds each operand as a query
/// parameter. String interpolation into query text is forbidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    Contains { field: String, value: String },
    StartsWith { field: String, value: String },
    EndsWith { field: String, value: String },
    GreaterThan { field: String, value: f64 },
    LessThan { field: String, value: f64 },
    Between { field: String, low: f64, high: f64 },
    In { field: String, values: Vec<Value> },
    NotIn { field: String, values: Vec<Value> },
    IsNull { field: String },
    IsNotNull { field: String },
    DateEquals { field: String, date: NaiveDate },
    DateBefore { field: String, date: NaiveDate },
    DateAfter { field: String, date: NaiveDate },
    DateBetween { field: String, start: NaiveDate, end: NaiveDate },
}

/// A composed, parameterized query constraint. Conditions combine with
/// logical AND; there is no cross-field OR composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// In-process evaluation of the predicate against one row. Backends with
    /// their own query planner translate [`Condition`]s instead.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::NotEquals { field, .. }
            | Condition::Contains { field, .. }
            | Condition::StartsWith { field, .. }
            | Condition::EndsWith { field, .. }
            | Condition::GreaterThan { field, .. }
            | Condition::LessThan { field, .. }
            | Condition::Between { field, .. }
            | Condition::In { field, .. }
            | Condition::NotIn { field, .. }
            | Condition::IsNull { field }
            | Condition::IsNotNull { field }
            | Condition::DateEquals { field, .. }
            | Condition::DateBefore { field, .. }
            | Condition::DateAfter { field, .. }
            | Condition::DateBetween { field, .. } => field,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let cell = resolve_path(row, self.field());
        match self {
            Condition::Equals { value, .. } => cell.map(|c| values_equal(c, value)).unwrap_or(false),
            Condition::NotEquals { value, .. } => {
                cell.map(|c| !values_equal(c, value)).unwrap_or(true)
            }
            Condition::Contains { value, .. } => {
                string_test(cell, |s| s.to_lowercase().contains(&value.to_lowercase()))
            }
            Condition::StartsWith { value, .. } => {
                string_test(cell, |s| s.to_lowercase().starts_with(&value.to_lowercase()))
            }
            Condition::EndsWith { value, .. } => {
                string_test(cell, |s| s.to_lowercase().ends_with(&value.to_lowercase()))
            }
            Condition::GreaterThan { value, .. } => number_test(cell, |n| n > *value),
            Condition::LessThan { value, .. } => number_test(cell, |n| n < *value),
            Condition::Between { low, high, .. } => number_test(cell, |n| n >= *low && n <= *high),
            Condition::In { values, .. } => cell
                .map(|c| values.iter().any(|v| values_equal(c, v)))
                .unwrap_or(false),
            Condition::NotIn { values, .. } => cell
                .map(|c| !values.iter().any(|v| values_equal(c, v)))
                .unwrap_or(true),
            Condition::IsNull { .. } => cell.map(|c| c.is_null()).unwrap_or(true),
            Condition::IsNotNull { .. } => cell.map(|c| !c.is_null()).unwrap_or(false),
            Condition::DateEquals { date, .. } => date_test(cell, |d| d == *date),
            Condition::DateBefore { date, .. } => date_test(cell, |d| d < *date),
            Condition::DateAfter { date, .. } => date_test(cell, |d| d > *date),
            Condition::DateBetween { start, end, .. } => {
                date_test(cell, |d| d >= *start && d <= *end)
            }
        }
    }
}

/// Equality with numeric coercion, so an integer row value matches a float
/// operand. Other shapes compare structurally.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn string_test(cell: Option<&Value>, test: impl Fn(&str) -> bool) -> bool {
    cell.and_then(Value::as_str).map(test).unwrap_or(false)
}

fn number_test(cell: Option<&Value>, test: impl Fn(f64) -> bool) -> bool {
    cell.and_then(Value::as_f64).map(test).unwrap_or(false)
}

fn date_test(cell: Option<&Value>, test: impl Fn(NaiveDate) -> bool) -> bool {
    cell.and_then(Value::as_str)
        .and_then(parse_date)
        .map(test)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        json!({ "amount": value }).as_object().unwrap().clone()
    }

    #[test]
    fn equals_coerces_numeric_types() {
        let condition = Condition::Equals {
            field: "amount".to_string(),
            value: json!(100.0),
        };
        assert!(condition.matches(&row(json!(100))));
        assert!(!condition.matches(&row(json!(99))));
    }

    #[test]
    fn substring_tests_are_case_insensitive() {
        let condition = Condition::Contains {
            field: "amount".to_string(),
            value: "ACT".to_string(),
        };
        assert!(condition.matches(&row(json!("active"))));
        assert!(!condition.matches(&row(json!("suspended"))));
    }

    #[test]
    fn between_is_inclusive() {
        let condition = Condition::Between {
            field: "amount".to_string(),
            low: 10.0,
            high: 20.0,
        };
        assert!(condition.matches(&row(json!(10))));
        assert!(condition.matches(&row(json!(20))));
        assert!(!condition.matches(&row(json!(20.5))));
    }

    #[test]
    fn is_null_treats_missing_field_as_null() {
        let condition = Condition::IsNull {
            field: "missing".to_string(),
        };
        assert!(condition.matches(&row(json!(1))));
        let not_null = Condition::IsNotNull {
            field: "missing".to_string(),
        };
        assert!(!not_null.matches(&row(json!(1))));
    }

    #[test]
    fn date_between_parses_timestamps() {
        let condition = Condition::DateBetween {
            field: "amount".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        assert!(condition.matches(&row(json!("2024-01-15"))));
        assert!(condition.matches(&row(json!("2024-01-31 23:10:00"))));
        assert!(!condition.matches(&row(json!("2024-02-01"))));
    }

    #[test]
    fn predicate_ands_all_conditions() {
        let predicate = Predicate::new(vec![
            Condition::GreaterThan {
                field: "amount".to_string(),
                value: 5.0,
            },
            Condition::LessThan {
                field: "amount".to_string(),
                value: 10.0,
            },
        ]);
        assert!(predicate.matches(&row(json!(7))));
        assert!(!predicate.matches(&row(json!(12))));
    }
}
