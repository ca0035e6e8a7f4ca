//! Role-based visibility for definitions.
//!
//! A definition with an empty `allowed_roles` list is visible to every
//! authenticated caller. Otherwise the caller needs at least one of the
//! listed roles. Role names match exactly, case-sensitive.

use std::collections::HashSet;

use crate::schema::types::SchemaDefinition;

/// Whether a caller holding `roles` may see and render `definition`.
pub fn is_visible(definition: &SchemaDefinition, roles: &HashSet<String>) -> bool {
    definition.allowed_roles.is_empty()
        || definition.allowed_roles.iter().any(|r| roles.contains(r))
}
