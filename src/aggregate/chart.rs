//! Chart series construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{apply, AggregateValue};
use crate::schema::types::ChartSpec;
use crate::source::{resolve_path, Row};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: AggregateValue,
}

/// The data series of one chart, labels paired with reduced values in
/// group-encounter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub points: Vec<SeriesPoint>,
}

/// Builds a chart's series from the report's base row set.
///
/// With a `group_field`, rows are grouped by it (first-seen order preserved)
/// and `data_field` is reduced per group with the chart's aggregation
/// function; each point's label is the group's `label_field` value. Without
/// one, every row yields a point carrying its raw `data_field` value.
pub fn build_series(rows: &[Row], chart: &ChartSpec) -> ChartSeries {
    let points = match &chart.group_field {
        Some(group_field) => grouped_points(rows, chart, group_field),
        None => rows
            .iter()
            .map(|row| SeriesPoint {
                label: label_of(row, &chart.label_field),
                value: resolve_path(row, &chart.data_field)
                    .and_then(Value::as_f64)
                    .map(AggregateValue::Number)
                    .unwrap_or(AggregateValue::NoData),
            })
            .collect(),
    };
    ChartSeries { points }
}

fn grouped_points(rows: &[Row], chart: &ChartSpec, group_field: &str) -> Vec<SeriesPoint> {
    // Group-encounter order; ties broken by first-seen order in the input.
    let mut order: Vec<Value> = Vec::new();
    let mut buckets: Vec<Vec<Row>> = Vec::new();
    for row in rows {
        let group = resolve_path(row, group_field).cloned().unwrap_or(Value::Null);
        match order.iter().position(|g| g == &group) {
            Some(index) => buckets[index].push(row.clone()),
            None => {
                order.push(group);
                buckets.push(vec![row.clone()]);
            }
        }
    }

    buckets
        .iter()
        .map(|bucket| SeriesPoint {
            label: bucket
                .first()
                .map(|row| label_of(row, &chart.label_field))
                .unwrap_or_default(),
            value: apply(chart.aggregation, bucket, &chart.data_field),
        })
        .collect()
}

fn label_of(row: &Row, label_field: &str) -> String {
    match resolve_path(row, label_field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::from("-"),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Aggregation, ChartType, LocalizedText};
    use serde_json::json;

    fn rows() -> Vec<Row> {
        [
            json!({ "department": "CS", "amount": 100 }),
            json!({ "department": "CS", "amount": 50 }),
            json!({ "department": "Math", "amount": 30 }),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
    }

    #[test]
    fn grouped_bar_series_sums_in_first_seen_order() {
        let chart = ChartSpec::new(
            "by_department",
            ChartType::Bar,
            LocalizedText::en_only("By department"),
            "department",
            "amount",
        )
        .grouped_by("department", Aggregation::Sum);

        let series = build_series(&rows(), &chart);
        assert_eq!(
            series.points,
            vec![
                SeriesPoint {
                    label: "CS".to_string(),
                    value: AggregateValue::Number(150.0),
                },
                SeriesPoint {
                    label: "Math".to_string(),
                    value: AggregateValue::Number(30.0),
                },
            ]
        );
    }

    #[test]
    fn ungrouped_series_is_one_point_per_row() {
        let chart = ChartSpec::new(
            "raw",
            ChartType::Line,
            LocalizedText::en_only("Raw"),
            "department",
            "amount",
        );
        let series = build_series(&rows(), &chart);
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[0].value, AggregateValue::Number(100.0));
    }

    #[test]
    fn count_aggregation_counts_group_rows() {
        let chart = ChartSpec::new(
            "counts",
            ChartType::Pie,
            LocalizedText::en_only("Counts"),
            "department",
            "amount",
        )
        .grouped_by("department", Aggregation::Count);
        let series = build_series(&rows(), &chart);
        assert_eq!(series.points[0].value, AggregateValue::Count(2));
        assert_eq!(series.points[1].value, AggregateValue::Count(1));
    }
}
