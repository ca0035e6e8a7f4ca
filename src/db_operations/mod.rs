//! Persistence layer over sled.
//!
//! `DbOperations` owns the per-kind definition trees; `definition_operations`
//! adds the typed accessors the store uses.

pub mod core;
pub mod definition_operations;

pub use core::DbOperations;
