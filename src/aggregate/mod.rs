//! Aggregation engine for report fields.
//!
//! Computes grand totals over all rows and subtotals per group. Rows must
//! already be sorted by the group-key sequence before subtotal computation;
//! the engine walks them in order and flushes a subtotal whenever the group
//! tuple changes. It does not sort.

pub mod chart;

pub use chart::{build_series, ChartSeries, SeriesPoint};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::types::{Aggregation, FieldSpec};
use crate::source::{resolve_path, Row};

/// Result of one aggregation. `NoData` is the defined marker for aggregates
/// over zero usable values; `avg` of an empty row set is `NoData`, never a
/// division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateValue {
    NoData,
    Number(f64),
    Count(u64),
}

impl AggregateValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            AggregateValue::NoData => None,
            AggregateValue::Number(n) => Some(n),
            AggregateValue::Count(c) => Some(c as f64),
        }
    }
}

/// Subtotal for one run of rows sharing a group-key tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSubtotal {
    /// Group-key field keys paired with the group's values, in group-key
    /// order.
    pub group: Vec<(String, Value)>,
    pub row_count: usize,
    /// Field key to aggregate, for fields flagged `include_in_subtotal`.
    pub values: HashMap<String, AggregateValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Field key to aggregate, for fields flagged `include_in_total`.
    pub grand_totals: HashMap<String, AggregateValue>,
    /// One entry per group, in row order.
    pub subtotals: Vec<GroupSubtotal>,
}

/// Computes grand totals and per-group subtotals for the given fields.
pub fn aggregate(rows: &[Row], fields: &[FieldSpec]) -> AggregateResult {
    let total_fields: Vec<&FieldSpec> = fields
        .iter()
        .filter(|f| f.include_in_total && f.aggregation.is_some())
        .collect();
    let subtotal_fields: Vec<&FieldSpec> = fields
        .iter()
        .filter(|f| f.include_in_subtotal && f.aggregation.is_some())
        .collect();
    let mut group_keys: Vec<&FieldSpec> = fields.iter().filter(|f| f.is_group_key).collect();
    group_keys.sort_by_key(|f| f.sort_order);

    let grand_totals = total_fields
        .iter()
        .map(|f| (f.key.clone(), apply(f.aggregation.unwrap_or(Aggregation::Count), rows, &f.field_name)))
        .collect();

    let mut subtotals = Vec::new();
    if !group_keys.is_empty() && !subtotal_fields.is_empty() {
        let mut start = 0;
        let mut current = group_tuple(&rows[..], 0, &group_keys);
        for index in 1..=rows.len() {
            let next = if index < rows.len() {
                group_tuple(rows, index, &group_keys)
            } else {
                None
            };
            if next != current {
                if let Some(group) = current.take() {
                    subtotals.push(flush_group(&rows[start..index], group, &subtotal_fields));
                }
                start = index;
                current = next;
            }
        }
    }

    AggregateResult {
        grand_totals,
        subtotals,
    }
}

fn group_tuple(rows: &[Row], index: usize, keys: &[&FieldSpec]) -> Option<Vec<(String, Value)>> {
    let row = rows.get(index)?;
    Some(
        keys.iter()
            .map(|f| {
                (
                    f.key.clone(),
                    resolve_path(row, &f.field_name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect(),
    )
}

fn flush_group(
    rows: &[Row],
    group: Vec<(String, Value)>,
    fields: &[&FieldSpec],
) -> GroupSubtotal {
    let values = fields
        .iter()
        .map(|f| (f.key.clone(), apply(f.aggregation.unwrap_or(Aggregation::Count), rows, &f.field_name)))
        .collect();
    GroupSubtotal {
        group,
        row_count: rows.len(),
        values,
    }
}

/// Applies one aggregation function over a field across rows. Non-numeric
/// and missing cells are skipped for the numeric functions; `count` counts
/// rows.
pub(crate) fn apply(aggregation: Aggregation, rows: &[Row], field: &str) -> AggregateValue {
    if aggregation == Aggregation::Count {
        return AggregateValue::Count(rows.len() as u64);
    }
    let numbers: Vec<f64> = rows
        .iter()
        .filter_map(|row| resolve_path(row, field).and_then(Value::as_f64))
        .collect();
    if numbers.is_empty() {
        return AggregateValue::NoData;
    }
    let value = match aggregation {
        Aggregation::Sum => numbers.iter().sum(),
        Aggregation::Avg => numbers.iter().sum::<f64>() / numbers.len() as f64,
        Aggregation::Min => numbers.iter().cloned().fold(f64::INFINITY, f64::min),
        Aggregation::Max => numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Count => unreachable!(),
    };
    AggregateValue::Number(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DataType;
    use crate::schema::types::LocalizedText;
    use serde_json::json;

    fn rows(values: &[Value]) -> Vec<Row> {
        values
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn amount_field(aggregation: Aggregation) -> FieldSpec {
        let mut field = FieldSpec::new(
            "amount",
            "amount",
            DataType::Currency,
            LocalizedText::en_only("Amount"),
        )
        .with_aggregation(aggregation);
        field.include_in_total = true;
        field.include_in_subtotal = true;
        field
    }

    fn department_group() -> FieldSpec {
        let mut field = FieldSpec::new(
            "department",
            "department",
            DataType::Text,
            LocalizedText::en_only("Department"),
        );
        field.is_group_key = true;
        field
    }

    #[test]
    fn avg_over_empty_rows_is_no_data() {
        let result = aggregate(&[], &[amount_field(Aggregation::Avg)]);
        assert_eq!(result.grand_totals["amount"], AggregateValue::NoData);
    }

    #[test]
    fn grand_totals_sum_and_count() {
        let rows = rows(&[
            json!({ "amount": 100, "department": "CS" }),
            json!({ "amount": 50, "department": "CS" }),
        ]);
        let sum = aggregate(&rows, &[amount_field(Aggregation::Sum)]);
        assert_eq!(sum.grand_totals["amount"], AggregateValue::Number(150.0));

        let count = aggregate(&rows, &[amount_field(Aggregation::Count)]);
        assert_eq!(count.grand_totals["amount"], AggregateValue::Count(2));
    }

    #[test]
    fn subtotals_follow_presorted_group_runs() {
        let rows = rows(&[
            json!({ "amount": 100, "department": "CS" }),
            json!({ "amount": 50, "department": "CS" }),
            json!({ "amount": 30, "department": "Math" }),
        ]);
        let result = aggregate(
            &rows,
            &[amount_field(Aggregation::Sum), department_group()],
        );
        assert_eq!(result.subtotals.len(), 2);
        assert_eq!(
            result.subtotals[0].group,
            vec![("department".to_string(), json!("CS"))]
        );
        assert_eq!(result.subtotals[0].row_count, 2);
        assert_eq!(
            result.subtotals[0].values["amount"],
            AggregateValue::Number(150.0)
        );
        assert_eq!(
            result.subtotals[1].values["amount"],
            AggregateValue::Number(30.0)
        );
    }

    #[test]
    fn non_numeric_cells_are_skipped_by_numeric_functions() {
        let rows = rows(&[
            json!({ "amount": 10 }),
            json!({ "amount": "n/a" }),
            json!({ "amount": 20 }),
        ]);
        assert_eq!(
            apply(Aggregation::Avg, &rows, "amount"),
            AggregateValue::Number(15.0)
        );
        assert_eq!(
            apply(Aggregation::Min, &rows, "amount"),
            AggregateValue::Number(10.0)
        );
    }
}
