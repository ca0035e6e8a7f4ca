//! In-process data source backed by plain row vectors.
//!
//! Backs the test suite and small deployments that load their record sets
//! up front. Query execution applies the predicate row by row, then sorts
//! and paginates.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use super::{resolve_path, DataSource, Page, QueryRequest, Row, SortDirection, SourceSchema};
use crate::error::{EngineError, EngineResult};

#[derive(Default)]
pub struct MemorySource {
    sources: HashMap<String, (SourceSchema, Vec<Row>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, schema: SourceSchema, rows: Vec<Row>) {
        self.sources.insert(schema.name.clone(), (schema, rows));
    }

    pub fn with_source(mut self, schema: SourceSchema, rows: Vec<Row>) -> Self {
        self.add_source(schema, rows);
        self
    }
}

impl DataSource for MemorySource {
    fn schema(&self, source: &str) -> Option<SourceSchema> {
        self.sources.get(source).map(|(schema, _)| schema.clone())
    }

    fn query(&self, source: &str, request: &QueryRequest) -> EngineResult<Vec<Row>> {
        let (_, rows) = self
            .sources
            .get(source)
            .ok_or_else(|| EngineError::DataSource {
                message: format!("unknown source '{}'", source),
            })?;

        let mut matched: Vec<Row> = rows
            .iter()
            .filter(|row| request.predicate.matches(row))
            .cloned()
            .collect();

        for key in request.sort.iter().rev() {
            matched.sort_by(|a, b| {
                let left = resolve_path(a, &key.field);
                let right = resolve_path(b, &key.field);
                let ordering = cmp_values(left, right);
                match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(Page { number, size }) = request.page {
            let start = number.saturating_sub(1) * size;
            matched = matched.into_iter().skip(start).take(size).collect();
        }

        Ok(matched)
    }
}

/// Total order over cell values for sorting: numbers, then strings, then
/// booleans; null and missing values sort last.
fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = |v: Option<&Value>| match v {
        None | Some(Value::Null) => 3,
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(_) => 2,
    };
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
