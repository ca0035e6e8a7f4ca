//! dyncontent is a metadata-driven content engine: administrators author
//! definitions describing tables, forms and reports over existing data
//! sources, and the engine turns a definition plus a record set into
//! validated queries, formatted cells, aggregates and chart series without
//! per-screen code.
//!
//! The crate splits into authoring-time and render-time halves. Authoring
//! goes through [`schema`] (the definition model, validation and the sled
//! backed store). Rendering goes through [`engine::ContentEngine`], which
//! compiles filter values into bound predicates ([`compiler`]), executes
//! them against a [`source::DataSource`], aggregates ([`aggregate`]) and
//! projects formatted output ([`render`]).

pub mod access;
pub mod aggregate;
pub mod compiler;
pub mod db_operations;
pub mod engine;
pub mod error;
pub mod registry;
pub mod render;
pub mod schema;
pub mod source;

pub use db_operations::DbOperations;
pub use engine::{ContentEngine, RenderRequest, RequestContext};
pub use error::{EngineError, EngineResult};
pub use registry::DataType;
pub use render::RenderedOutput;
pub use schema::types::{Lang, SchemaDefinition, SchemaKind};
pub use schema::{SchemaStore, ValidationIssue};
pub use source::{DataSource, MemorySource, Page, QueryRequest, Row, SortKey};
