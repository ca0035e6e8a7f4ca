use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::definition::LocalizedText;
use crate::registry::DataType;

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Comparison applied by a conditional styling rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleCondition {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    IsNull,
    IsNotNull,
}

/// One conditional styling rule. Rules are evaluated in declared order and
/// the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub condition: StyleCondition,
    /// Comparison operand; ignored for `IsNull`/`IsNotNull`.
    #[serde(default)]
    pub value: serde_json::Value,
    /// Opaque style token handed through to the presentation layer.
    pub style: String,
}

/// One column of a table definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
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
    pub align: Align,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub is_frozen: bool,
    #[serde(default = "default_true")]
    pub is_resizable: bool,
    #[serde(default)]
    pub is_sortable: bool,
    #[serde(default)]
    pub is_searchable: bool,
    #[serde(default)]
    pub is_filterable: bool,
    #[serde(default = "default_true")]
    pub is_exportable: bool,
    /// Open map of formatting overrides (`decimals`, `symbol`, `format`, ...).
    /// Formatters parse only the keys they recognize.
    #[serde(default)]
    pub format_options: HashMap<String, String>,
    #[serde(default)]
    pub conditional_styles: Vec<StyleRule>,
    /// Status value (lowercased) to color token, for `status` columns.
    #[serde(default)]
    pub status_colors: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
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
            align: Align::Left,
            width: None,
            is_frozen: false,
            is_resizable: true,
            is_sortable: false,
            is_searchable: false,
            is_filterable: false,
            is_exportable: true,
            format_options: HashMap::new(),
            conditional_styles: Vec::new(),
            status_colors: HashMap::new(),
        }
    }
}
