//! Unified error type for the dyncontent engine.
//!
//! Authoring-time failures (`Validation`, `UnknownType`, `UnresolvedField`)
//! are raised before a definition is persisted and never reach render time.
//! Render-time failures abort the whole render call; no partial output is
//! ever returned in their place.

use crate::schema::types::SchemaKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A definition or a supplied filter/parameter value failed validation.
    #[error("Validation failed for '{key}': {message}")]
    Validation { key: String, message: String },

    /// A definition references a data type that is not registered.
    #[error("Unknown data type: {name}")]
    UnknownType { name: String },

    /// A declared field path does not resolve against the target source.
    /// The field is kept as plain data; this variant has no error cause.
    #[error("Field '{field}' does not resolve against source '{source_name}'")]
    UnresolvedField { field: String, source_name: String },

    /// The caller holds none of the roles the definition requires.
    #[error("Access denied to definition '{key}'")]
    AccessDenied { key: String },

    /// No definition exists under the given kind and key.
    #[error("{kind} definition not found: {key}")]
    NotFound { kind: SchemaKind, key: String },

    /// The underlying query execution failed or timed out.
    #[error("Data source error: {message}")]
    DataSource { message: String },

    /// The schema store could not be read or written.
    #[error("Store error: {message}")]
    Store { message: String },
}

impl EngineError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

impl From<sled::Error> for EngineError {
    fn from(error: sled::Error) -> Self {
        EngineError::store(error.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::store(error.to_string())
    }
}

/// Result type alias for operations that can fail with an [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unresolved_field_formats_and_carries_no_cause() {
        let err = EngineError::UnresolvedField {
            field: "student.gpa".to_string(),
            source_name: "payments".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Field 'student.gpa' does not resolve against source 'payments'"
        );
        assert!(err.source().is_none());
    }
}
