use serde::{Deserialize, Serialize};

use super::definition::LocalizedText;
use super::field::Aggregation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Donut,
    Radar,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// One chart of a report definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Stable key, unique within the parent definition.
    pub key: String,
    pub chart_type: ChartType,
    pub title: LocalizedText,
    /// Source field supplying point labels.
    pub label_field: String,
    /// Source field supplying point values.
    pub data_field: String,
    /// When set, rows are grouped by this field and `data_field` is reduced
    /// per group with `aggregation`; groups keep first-seen row order.
    #[serde(default)]
    pub group_field: Option<String>,
    #[serde(default = "default_aggregation")]
    pub aggregation: Aggregation,
    /// Ordered color palette, cycled over the series.
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default)]
    pub show_labels: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub legend_position: LegendPosition,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

fn default_aggregation() -> Aggregation {
    Aggregation::Sum
}

fn default_true() -> bool {
    true
}

impl ChartSpec {
    pub fn new(
        key: impl Into<String>,
        chart_type: ChartType,
        title: LocalizedText,
        label_field: impl Into<String>,
        data_field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            chart_type,
            title,
            label_field: label_field.into(),
            data_field: data_field.into(),
            group_field: None,
            aggregation: Aggregation::Sum,
            colors: Vec::new(),
            show_legend: true,
            show_labels: false,
            show_grid: true,
            legend_position: LegendPosition::Bottom,
            sort_order: 0,
            is_visible: true,
        }
    }

    pub fn grouped_by(mut self, group_field: impl Into<String>, aggregation: Aggregation) -> Self {
        self.group_field = Some(group_field.into());
        self.aggregation = aggregation;
        self
    }
}
