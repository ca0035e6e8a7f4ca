//! Engine facade tying the store, compiler, data source and renderer
//! together.
//!
//! Administrative operations (save, delete, activate) validate before they
//! touch the store. The render path treats the definition as an immutable
//! snapshot: lookup, access check, filter compilation, query and projection
//! all run against one clone of the definition.

use log::{info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::access;
use crate::compiler;
use crate::error::{EngineError, EngineResult};
use crate::render::{self, RenderedOutput};
use crate::schema::types::{Lang, SchemaDefinition, SchemaKind};
use crate::schema::{validate, SchemaStore, ValidationIssue};
use crate::source::{DataSource, Page, QueryRequest, SortKey};

/// Caller identity and presentation choices for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub roles: HashSet<String>,
    pub lang: Lang,
}

impl RequestContext {
    pub fn new(roles: impl IntoIterator<Item = impl Into<String>>, lang: Lang) -> Self {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            lang,
        }
    }
}

/// Everything a render call accepts beyond the definition key.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Filter/parameter values keyed by filter spec key.
    pub filter_values: HashMap<String, Value>,
    pub sort: Vec<SortKey>,
    pub page: Option<Page>,
    pub timeout: Option<Duration>,
}

/// The metadata-driven content engine.
pub struct ContentEngine<S: DataSource> {
    store: SchemaStore,
    source: S,
}

impl<S: DataSource> ContentEngine<S> {
    pub fn new(store: SchemaStore, source: S) -> Self {
        Self { store, source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Active definitions of a kind the caller may see, in `sort_order`.
    pub fn list_definitions(
        &self,
        kind: SchemaKind,
        context: &RequestContext,
    ) -> EngineResult<Vec<SchemaDefinition>> {
        Ok(self
            .store
            .list(kind)?
            .into_iter()
            .filter(|d| access::is_visible(d, &context.roles))
            .collect())
    }

    /// One definition, active or not, with the access check applied.
    pub fn get_definition(
        &self,
        kind: SchemaKind,
        key: &str,
        context: &RequestContext,
    ) -> EngineResult<SchemaDefinition> {
        let definition = self
            .store
            .get(kind, key)?
            .ok_or_else(|| EngineError::NotFound {
                kind,
                key: key.to_string(),
            })?;
        if !access::is_visible(&definition, &context.roles) {
            return Err(EngineError::AccessDenied {
                key: key.to_string(),
            });
        }
        Ok(definition)
    }

    /// Validates without saving; returns the full issue list.
    pub fn validate_definition(&self, definition: &SchemaDefinition) -> Vec<ValidationIssue> {
        validate(definition, Some(&self.source))
    }

    /// Validates and persists. The first validation issue aborts the save.
    pub fn save_definition(
        &self,
        definition: SchemaDefinition,
    ) -> EngineResult<SchemaDefinition> {
        let issues = self.validate_definition(&definition);
        if let Some(issue) = issues.into_iter().next() {
            warn!(
                "rejected {} definition '{}': {}",
                definition.kind, definition.key, issue.message
            );
            return Err(EngineError::validation(issue.key, issue.message));
        }
        self.store.save(definition)
    }

    pub fn delete_definition(&self, kind: SchemaKind, key: &str) -> EngineResult<bool> {
        self.store.delete(kind, key)
    }

    pub fn set_active(&self, kind: SchemaKind, key: &str, active: bool) -> EngineResult<()> {
        self.store.set_active(kind, key, active)
    }

    /// Every stored definition of a kind, inactive included. Administrative
    /// surface; no role filtering.
    pub fn list_all_definitions(&self, kind: SchemaKind) -> EngineResult<Vec<SchemaDefinition>> {
        self.store.list_all(kind)
    }

    /// Full render cycle for one definition.
    pub fn render(
        &self,
        kind: SchemaKind,
        key: &str,
        context: &RequestContext,
        request: &RenderRequest,
    ) -> EngineResult<RenderedOutput> {
        let definition = self
            .store
            .get(kind, key)?
            .filter(|d| d.is_active)
            .ok_or_else(|| EngineError::NotFound {
                kind,
                key: key.to_string(),
            })?;
        if !access::is_visible(&definition, &context.roles) {
            return Err(EngineError::AccessDenied {
                key: key.to_string(),
            });
        }

        let ordered_filters: Vec<_> = definition
            .ordered_filters()
            .into_iter()
            .cloned()
            .collect();
        let predicate = compiler::compile(&ordered_filters, &request.filter_values)?;
        let sort = self.effective_sort(&definition, &request.sort);

        let query = QueryRequest {
            predicate,
            sort,
            page: request.page,
            timeout: request.timeout,
        };
        let rows = self.source.query(&definition.target, &query)?;
        info!(
            "rendering {} '{}': {} rows",
            definition.kind,
            definition.key,
            rows.len()
        );

        render::project(&definition, &rows, context.lang)
    }

    /// Keeps only sort keys that map to a sortable visible column; anything
    /// else in the request is dropped, never an error.
    fn effective_sort(&self, definition: &SchemaDefinition, sort: &[SortKey]) -> Vec<SortKey> {
        if definition.kind != SchemaKind::Table {
            return sort.to_vec();
        }
        sort.iter()
            .filter(|key| {
                definition
                    .columns
                    .iter()
                    .any(|c| c.is_sortable && c.field_name == key.field)
            })
            .cloned()
            .collect()
    }
}
