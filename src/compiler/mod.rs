//! Filter/parameter compiler.
//!
//! Translates user-supplied filter values plus their declared operators into
//! a [`Predicate`] of bound conditions. Value shapes are validated against
//! the spec's declared data type before anything is bound; unknown value keys
//! are ignored so stale client state never fails a render.

pub mod predicate;

pub use predicate::{Condition, Predicate};

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::registry::{self, parse_date};
use crate::schema::types::{FilterSpec, Operator};

/// Compiles the given filter specs against the supplied values.
///
/// Specs without a present value (and no default) are skipped unless marked
/// required. Conditions are combined with logical AND by the resulting
/// predicate.
pub fn compile(specs: &[FilterSpec], values: &HashMap<String, Value>) -> EngineResult<Predicate> {
    let mut predicate = Predicate::default();
    for spec in specs {
        let supplied = values.get(&spec.key);
        if spec.is_required && supplied.map(is_empty).unwrap_or(false) {
            return Err(EngineError::validation(
                &spec.key,
                "a value is required but an empty one was supplied",
            ));
        }

        let effective = supplied
            .filter(|v| !is_empty(v))
            .or(spec.default_value.as_ref())
            .filter(|v| !is_empty(v));

        let value = match effective {
            Some(value) => value,
            None if spec.is_required => {
                return Err(EngineError::validation(
                    &spec.key,
                    "a value is required but none was supplied",
                ));
            }
            None => continue,
        };

        predicate.push(bind(spec, value)?);
    }
    Ok(predicate)
}

/// Validates one value against its spec and binds it into a condition. The
/// authoring validator runs this over `default_value` too, so a default that
/// can never bind is rejected at save time instead of failing every render.
pub(crate) fn bind(spec: &FilterSpec, value: &Value) -> EngineResult<Condition> {
    let descriptor = registry::describe(spec.data_type);
    if !descriptor.allows_operator(spec.operator) {
        return Err(EngineError::validation(
            &spec.key,
            format!(
                "operator '{}' is not valid for type '{}'",
                spec.operator, spec.data_type
            ),
        ));
    }

    let field = spec.field_name.clone();
    match spec.operator {
        Operator::IsNull => Ok(Condition::IsNull { field }),
        Operator::IsNotNull => Ok(Condition::IsNotNull { field }),
        Operator::Equals => {
            expect_scalar(spec, value)?;
            Ok(Condition::Equals {
                field,
                value: value.clone(),
            })
        }
        Operator::NotEquals => {
            expect_scalar(spec, value)?;
            Ok(Condition::NotEquals {
                field,
                value: value.clone(),
            })
        }
        Operator::Contains => Ok(Condition::Contains {
            field,
            value: expect_string(spec, value)?,
        }),
        Operator::StartsWith => Ok(Condition::StartsWith {
            field,
            value: expect_string(spec, value)?,
        }),
        Operator::EndsWith => Ok(Condition::EndsWith {
            field,
            value: expect_string(spec, value)?,
        }),
        Operator::GreaterThan => Ok(Condition::GreaterThan {
            field,
            value: expect_number(spec, value)?,
        }),
        Operator::LessThan => Ok(Condition::LessThan {
            field,
            value: expect_number(spec, value)?,
        }),
        Operator::Between => {
            let [low, high] = expect_pair(spec, value)?;
            Ok(Condition::Between {
                field,
                low: expect_number(spec, &low)?,
                high: expect_number(spec, &high)?,
            })
        }
        Operator::In => Ok(Condition::In {
            field,
            values: expect_list(spec, value)?,
        }),
        Operator::NotIn => Ok(Condition::NotIn {
            field,
            values: expect_list(spec, value)?,
        }),
        Operator::DateEquals => Ok(Condition::DateEquals {
            field,
            date: expect_date(spec, value)?,
        }),
        Operator::DateBefore => Ok(Condition::DateBefore {
            field,
            date: expect_date(spec, value)?,
        }),
        Operator::DateAfter => Ok(Condition::DateAfter {
            field,
            date: expect_date(spec, value)?,
        }),
        Operator::DateBetween => {
            let [start, end] = expect_pair(spec, value)?;
            Ok(Condition::DateBetween {
                field,
                start: expect_date(spec, &start)?,
                end: expect_date(spec, &end)?,
            })
        }
    }
}

/// Empty values are skipped rather than bound: null, empty string, empty
/// array, empty object.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn expect_scalar(spec: &FilterSpec, value: &Value) -> EngineResult<()> {
    let descriptor = registry::describe(spec.data_type);
    if (descriptor.validate)(value) {
        Ok(())
    } else {
        Err(EngineError::validation(
            &spec.key,
            format!("value does not match declared type '{}'", spec.data_type),
        ))
    }
}

fn expect_string(spec: &FilterSpec, value: &Value) -> EngineResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation(&spec.key, "expected a string value"))
}

fn expect_number(spec: &FilterSpec, value: &Value) -> EngineResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| EngineError::validation(&spec.key, "expected a numeric value"))
}

fn expect_date(spec: &FilterSpec, value: &Value) -> EngineResult<chrono::NaiveDate> {
    value
        .as_str()
        .and_then(parse_date)
        .ok_or_else(|| EngineError::validation(&spec.key, "expected a date value"))
}

fn expect_pair(spec: &FilterSpec, value: &Value) -> EngineResult<[Value; 2]> {
    match value.as_array() {
        Some(items) if items.len() == 2 => Ok([items[0].clone(), items[1].clone()]),
        _ => Err(EngineError::validation(
            &spec.key,
            "expected an array of exactly two values",
        )),
    }
}

fn expect_list(spec: &FilterSpec, value: &Value) -> EngineResult<Vec<Value>> {
    let items = value
        .as_array()
        .ok_or_else(|| EngineError::validation(&spec.key, "expected an array of values"))?;
    for item in items {
        expect_scalar(spec, item)?;
    }
    Ok(items.clone())
}
