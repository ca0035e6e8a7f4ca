//! Conditional styling and status colors.

use serde_json::Value;
use std::collections::HashMap;

use crate::compiler::predicate::values_equal;
use crate::schema::types::{StyleCondition, StyleRule};

/// Applies the rules in declared order; the first matching rule's style
/// wins.
pub fn first_match<'a>(rules: &'a [StyleRule], value: &Value) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| rule_matches(rule, value))
        .map(|rule| rule.style.as_str())
}

fn rule_matches(rule: &StyleRule, value: &Value) -> bool {
    match rule.condition {
        StyleCondition::Equals => values_equal(value, &rule.value),
        StyleCondition::NotEquals => !values_equal(value, &rule.value),
        StyleCondition::GreaterThan => numeric(value, &rule.value, |a, b| a > b),
        StyleCondition::LessThan => numeric(value, &rule.value, |a, b| a < b),
        StyleCondition::GreaterOrEqual => numeric(value, &rule.value, |a, b| a >= b),
        StyleCondition::LessOrEqual => numeric(value, &rule.value, |a, b| a <= b),
        StyleCondition::Contains => match (value.as_str(), rule.value.as_str()) {
            (Some(haystack), Some(needle)) => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        },
        StyleCondition::IsNull => value.is_null(),
        StyleCondition::IsNotNull => !value.is_null(),
    }
}

fn numeric(value: &Value, operand: &Value, test: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_f64(), operand.as_f64()) {
        (Some(a), Some(b)) => test(a, b),
        _ => false,
    }
}

/// Color token for a status value; lookup is by lowercased value, `gray`
/// when unmapped.
pub fn status_color(colors: &HashMap<String, String>, value: &Value) -> String {
    value
        .as_str()
        .and_then(|s| colors.get(&s.to_lowercase()))
        .cloned()
        .unwrap_or_else(|| "gray".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(condition: StyleCondition, value: Value, style: &str) -> StyleRule {
        StyleRule {
            condition,
            value,
            style: style.to_string(),
        }
    }

    #[test]
    fn first_declared_matching_rule_wins() {
        let rules = vec![
            rule(StyleCondition::GreaterThan, json!(50), "text-green"),
            rule(StyleCondition::GreaterThan, json!(10), "text-blue"),
        ];
        assert_eq!(first_match(&rules, &json!(80)), Some("text-green"));
        assert_eq!(first_match(&rules, &json!(20)), Some("text-blue"));
        assert_eq!(first_match(&rules, &json!(5)), None);
    }

    #[test]
    fn status_color_falls_back_to_gray() {
        let mut colors = HashMap::new();
        colors.insert("active".to_string(), "green".to_string());
        assert_eq!(status_color(&colors, &json!("ACTIVE")), "green");
        assert_eq!(status_color(&colors, &json!("UNKNOWN")), "gray");
    }
}
