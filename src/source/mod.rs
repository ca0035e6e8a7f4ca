//! Data-access capability the engine consumes.
//!
//! The engine does not assume a specific database or ORM; whatever
//! persistence layer backs the deployment implements [`DataSource`]. Query
//! execution is a synchronous call with a caller-supplied timeout; a
//! failure or timeout surfaces as `EngineError::DataSource` and aborts the
//! whole render cycle.

pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::compiler::Predicate;
use crate::error::EngineResult;

pub use memory::MemorySource;

/// One record returned by a data source. Related entities appear as nested
/// objects, so `program.name_en` resolves through the `program` key.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

/// Everything one query execution needs, bundled so the trait surface stays
/// small.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub predicate: Predicate,
    pub sort: Vec<SortKey>,
    pub page: Option<Page>,
    pub timeout: Option<Duration>,
}

/// Declared shape of one source, used for save-time field resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSchema {
    pub name: String,
    pub fields: Vec<String>,
    /// Relation name to the source it points at.
    #[serde(default)]
    pub relations: HashMap<String, String>,
}

impl SourceSchema {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            relations: HashMap::new(),
        }
    }

    pub fn with_relation(
        mut self,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.relations.insert(relation.into(), target.into());
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

/// The persistence capability the engine renders against.
pub trait DataSource {
    /// Declared schema of a source, or `None` when the source is unknown.
    fn schema(&self, source: &str) -> Option<SourceSchema>;

    /// Executes the constrained query. Every predicate operand travels as a
    /// typed bound value; implementations must never interpolate operands
    /// into query text.
    fn query(&self, source: &str, request: &QueryRequest) -> EngineResult<Vec<Row>>;
}

/// Resolves a possibly dotted field path against a row, one segment at a
/// time. No string concatenation ever reaches a query through this.
pub fn resolve_path<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
