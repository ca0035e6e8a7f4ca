use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::definition::LocalizedText;
use crate::registry::DataType;

/// Aggregation function applied to report fields and chart data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregation {
    /// Everything except `count` reads the field value as a number, so the
    /// declared type must be numeric. Checked at definition-save time.
    pub fn requires_numeric(self) -> bool {
        !matches!(self, Aggregation::Count)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Count => write!(f, "count"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
        }
    }
}

/// One field of a form definition or a report definition.
///
/// Report fields may carry an aggregation function plus flags controlling
/// whether they contribute to grand totals and per-group subtotals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Stable key, unique within the parent definition.
    pub key: String,
    /// Underlying source field; may cross a relation via `relation.column`.
    pub field_name: String,
    pub data_type: DataType,
    pub labels: LocalizedText,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
    #[serde(default)]
    pub include_in_total: bool,
    #[serde(default)]
    pub include_in_subtotal: bool,
    /// Group-key fields define the subtotal grouping sequence, in rendering
    /// order. Rows must arrive pre-sorted by these fields.
    #[serde(default)]
    pub is_group_key: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub format_options: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl FieldSpec {
    pub fn new(
        key: impl Into<String>,
        field_name: impl Into<String>,
        data_type: DataType,
        labels: LocalizedText,
    ) -> Self {
        Self {
            key: key.into(),
            field_name: field_name.into(),
            data_type,
            labels,
            sort_order: 0,
            is_visible: true,
            aggregation: None,
            include_in_total: false,
            include_in_subtotal: false,
            is_group_key: false,
            is_required: false,
            is_readonly: false,
            default_value: None,
            format_options: HashMap::new(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }
}
