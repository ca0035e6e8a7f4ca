use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::chart::ChartSpec;
use super::column::ColumnSpec;
use super::field::FieldSpec;
use super::filter::FilterSpec;

/// The kind of content a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Form,
    Table,
    Report,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Form => write!(f, "form"),
            SchemaKind::Table => write!(f, "table"),
            SchemaKind::Report => write!(f, "report"),
        }
    }
}

/// Request language for labels and formatted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    En,
    Ar,
}

/// An English/Arabic label pair.
///
/// Arabic falls back to English when the Arabic side is empty, so partially
/// translated definitions still render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default)]
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// English-only label; Arabic resolves to the English text.
    pub fn en_only(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: String::new(),
        }
    }

    pub fn get(&self, lang: Lang) -> &str {
        match lang {
            Lang::En => &self.en,
            Lang::Ar => {
                if self.ar.is_empty() {
                    &self.en
                } else {
                    &self.ar
                }
            }
        }
    }
}

/// Administrator-authored description of one Form, Table or Report.
///
/// Definitions are created and edited only through administrative operations;
/// at request time they are read-only and treated as an immutable snapshot for
/// the duration of one render/query cycle. Child specs are kept in insertion
/// order; rendering order is `sort_order` with ties broken by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Assigned by the store on first save.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub kind: SchemaKind,
    pub key: String,
    /// Name of the underlying data source this definition reads from.
    pub target: String,
    pub labels: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Empty means visible to all authenticated callers.
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub sort_order: i32,
    /// Open settings bag for presentation tweaks; consumers parse only the
    /// keys they recognize and ignore the rest.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Filters (tables) and parameters (reports) share one spec shape.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl SchemaDefinition {
    pub fn new(kind: SchemaKind, key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            key: key.into(),
            target: target.into(),
            labels: LocalizedText::default(),
            description: None,
            is_active: true,
            allowed_roles: Vec::new(),
            sort_order: 0,
            settings: HashMap::new(),
            columns: Vec::new(),
            fields: Vec::new(),
            filters: Vec::new(),
            charts: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Columns in rendering order. `sort_by_key` is stable, so equal
    /// `sort_order` values keep insertion order.
    pub fn ordered_columns(&self) -> Vec<&ColumnSpec> {
        let mut columns: Vec<&ColumnSpec> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.sort_order);
        columns
    }

    pub fn ordered_fields(&self) -> Vec<&FieldSpec> {
        let mut fields: Vec<&FieldSpec> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.sort_order);
        fields
    }

    pub fn ordered_filters(&self) -> Vec<&FilterSpec> {
        let mut filters: Vec<&FilterSpec> = self.filters.iter().collect();
        filters.sort_by_key(|f| f.sort_order);
        filters
    }

    pub fn ordered_charts(&self) -> Vec<&ChartSpec> {
        let mut charts: Vec<&ChartSpec> = self.charts.iter().collect();
        charts.sort_by_key(|c| c.sort_order);
        charts
    }

    /// Fields marked as group keys, in rendering order. Subtotal grouping
    /// follows this sequence.
    pub fn group_key_fields(&self) -> Vec<&FieldSpec> {
        self.ordered_fields()
            .into_iter()
            .filter(|f| f.is_group_key)
            .collect()
    }

    /// Keys of every child spec in declaration order, for uniqueness checks.
    pub fn child_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        keys.extend(self.columns.iter().map(|c| c.key.as_str()));
        keys.extend(self.fields.iter().map(|f| f.key.as_str()));
        keys.extend(self.filters.iter().map(|f| f.key.as_str()));
        keys.extend(self.charts.iter().map(|c| c.key.as_str()));
        keys
    }
}
