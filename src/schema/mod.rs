//! Definition model, validation and the persistent definition store.

pub mod core;
pub mod types;
pub mod validator;

pub use core::SchemaStore;
pub use types::{SchemaDefinition, SchemaKind};
pub use validator::{validate, ValidationIssue};
