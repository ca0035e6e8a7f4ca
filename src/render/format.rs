//! Default formatters per data type.
//!
//! Each formatter parses only the `format_options` keys it recognizes and
//! ignores the rest, so presentation tweaks never require a schema change.
//! Null and missing values render as the `-` placeholder, never as an error.

use serde_json::Value;
use std::collections::HashMap;

use crate::registry::{self, DataType};
use crate::schema::types::Lang;

pub(crate) const PLACEHOLDER: &str = "-";

type Options = HashMap<String, String>;

/// Formats one cell value with the type's default formatter, honoring
/// spec-level `format_options` overrides.
pub fn format_value(data_type: DataType, value: &Value, options: &Options, lang: Lang) -> String {
    (registry::describe(data_type).format)(value, options, lang)
}

fn opt_usize(options: &Options, key: &str, default: usize) -> usize {
    options
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn opt_str<'a>(options: &'a Options, key: &str, default: &'a str) -> &'a str {
    options.get(key).map(String::as_str).unwrap_or(default)
}

/// `1234.5` with two decimals and `,` grouping becomes `1,234.50`.
fn group_number(value: f64, decimals: usize, dec_point: &str, thousands_sep: &str) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(thousands_sep);
        }
        grouped.push(*digit);
    }

    let mut result = String::new();
    if value < 0.0 {
        result.push('-');
    }
    result.push_str(&grouped);
    if let Some(frac) = frac_part {
        result.push_str(dec_point);
        result.push_str(frac);
    }
    result
}

pub(crate) fn format_text(value: &Value, _options: &Options, _lang: Lang) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn format_number(value: &Value, options: &Options, _lang: Lang) -> String {
    numeric(value, options, 0)
}

pub(crate) fn format_decimal(value: &Value, options: &Options, _lang: Lang) -> String {
    numeric(value, options, 2)
}

fn numeric(value: &Value, options: &Options, default_decimals: usize) -> String {
    match value.as_f64() {
        Some(n) => group_number(
            n,
            opt_usize(options, "decimals", default_decimals),
            opt_str(options, "dec_point", "."),
            opt_str(options, "thousands_sep", ","),
        ),
        None => PLACEHOLDER.to_string(),
    }
}

pub(crate) fn format_currency(value: &Value, options: &Options, _lang: Lang) -> String {
    match value.as_f64() {
        Some(n) => {
            let number = group_number(
                n,
                opt_usize(options, "decimals", 2),
                opt_str(options, "dec_point", "."),
                opt_str(options, "thousands_sep", ","),
            );
            format!(
                "{}{}{}{}",
                opt_str(options, "prefix", ""),
                opt_str(options, "symbol", "$"),
                number,
                opt_str(options, "suffix", ""),
            )
        }
        None => PLACEHOLDER.to_string(),
    }
}

pub(crate) fn format_percentage(value: &Value, options: &Options, _lang: Lang) -> String {
    match value.as_f64() {
        Some(n) => {
            let number = group_number(
                n,
                opt_usize(options, "decimals", 1),
                opt_str(options, "dec_point", "."),
                opt_str(options, "thousands_sep", ","),
            );
            format!("{}%", number)
        }
        None => PLACEHOLDER.to_string(),
    }
}

pub(crate) fn format_date(value: &Value, options: &Options, _lang: Lang) -> String {
    temporal(value, options, "%Y-%m-%d", |s, pattern| {
        registry::parse_date(s).map(|d| d.format(pattern).to_string())
    })
}

pub(crate) fn format_datetime(value: &Value, options: &Options, _lang: Lang) -> String {
    temporal(value, options, "%Y-%m-%d %H:%M", |s, pattern| {
        registry::parse_datetime(s).map(|d| d.format(pattern).to_string())
    })
}

pub(crate) fn format_time(value: &Value, options: &Options, _lang: Lang) -> String {
    temporal(value, options, "%H:%M", |s, pattern| {
        registry::parse_time(s).map(|t| t.format(pattern).to_string())
    })
}

fn temporal(
    value: &Value,
    options: &Options,
    default_pattern: &str,
    parse: impl Fn(&str, &str) -> Option<String>,
) -> String {
    let pattern = opt_str(options, "format", default_pattern);
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        // An unparseable value renders as-is rather than failing the render.
        Value::String(s) => parse(s, pattern).unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

pub(crate) fn format_boolean(value: &Value, _options: &Options, lang: Lang) -> String {
    let truth = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    };
    match truth {
        Some(true) => match lang {
            Lang::En => "Yes".to_string(),
            Lang::Ar => "نعم".to_string(),
        },
        Some(false) => match lang {
            Lang::En => "No".to_string(),
            Lang::Ar => "لا".to_string(),
        },
        None => PLACEHOLDER.to_string(),
    }
}

pub(crate) fn format_json(value: &Value, _options: &Options, _lang: Lang) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(pairs: &[(&str, &str)]) -> Options {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn currency_with_symbol_and_decimals() {
        let formatted = format_value(
            DataType::Currency,
            &json!(1234.5),
            &options(&[("decimals", "2"), ("symbol", "$")]),
            Lang::En,
        );
        assert_eq!(formatted, "$1,234.50");
    }

    #[test]
    fn currency_suffix_override() {
        let formatted = format_value(
            DataType::Currency,
            &json!(99.0),
            &options(&[("symbol", ""), ("suffix", " SAR")]),
            Lang::En,
        );
        assert_eq!(formatted, "99.00 SAR");
    }

    #[test]
    fn numbers_group_thousands_and_keep_sign() {
        assert_eq!(group_number(1234567.0, 0, ".", ","), "1,234,567");
        assert_eq!(group_number(-1234.5, 2, ".", ","), "-1,234.50");
        assert_eq!(group_number(999.0, 0, ".", ","), "999");
    }

    #[test]
    fn unknown_format_option_keys_are_ignored() {
        let formatted = format_value(
            DataType::Number,
            &json!(5),
            &options(&[("glitter", "max")]),
            Lang::En,
        );
        assert_eq!(formatted, "5");
    }

    #[test]
    fn date_honors_format_pattern_and_falls_back_raw() {
        let formatted = format_value(
            DataType::Date,
            &json!("2024-01-15"),
            &options(&[("format", "%d/%m/%Y")]),
            Lang::En,
        );
        assert_eq!(formatted, "15/01/2024");

        let raw = format_value(DataType::Date, &json!("not a date"), &Options::new(), Lang::En);
        assert_eq!(raw, "not a date");
    }

    #[test]
    fn boolean_localizes() {
        assert_eq!(
            format_value(DataType::Boolean, &json!(true), &Options::new(), Lang::En),
            "Yes"
        );
        assert_eq!(
            format_value(DataType::Boolean, &json!(true), &Options::new(), Lang::Ar),
            "نعم"
        );
    }

    #[test]
    fn null_renders_placeholder_for_every_type() {
        for data_type in DataType::ALL {
            assert_eq!(
                format_value(data_type, &Value::Null, &Options::new(), Lang::En),
                PLACEHOLDER
            );
        }
    }
}
