//! In-memory definition registry backed by the sled store.

use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::db_operations::DbOperations;
use crate::error::{EngineError, EngineResult};
use crate::schema::types::{SchemaDefinition, SchemaKind};

/// Thread-safe registry of definitions.
///
/// All reads go through the in-memory map; the sled store is the durable
/// copy, written on every save and reloaded in full on startup. Lookups
/// return clones so a render cycle works on an immutable snapshot even if
/// an administrator saves mid-request.
pub struct SchemaStore {
    definitions: Mutex<HashMap<(SchemaKind, String), SchemaDefinition>>,
    db_ops: Arc<DbOperations>,
}

impl SchemaStore {
    /// Opens the store and loads every persisted definition into memory.
    pub fn new(db_ops: Arc<DbOperations>) -> EngineResult<Self> {
        let mut definitions = HashMap::new();
        for kind in [SchemaKind::Form, SchemaKind::Table, SchemaKind::Report] {
            for definition in db_ops.list_definitions(kind)? {
                definitions.insert((kind, definition.key.clone()), definition);
            }
        }
        info!("loaded {} persisted definitions", definitions.len());
        Ok(Self {
            definitions: Mutex::new(definitions),
            db_ops,
        })
    }

    fn lock(
        &self,
    ) -> EngineResult<std::sync::MutexGuard<'_, HashMap<(SchemaKind, String), SchemaDefinition>>>
    {
        self.definitions
            .lock()
            .map_err(|_| EngineError::store("definition registry lock poisoned"))
    }

    /// Persists a definition and updates the registry. Assigns an id on
    /// first save and maintains the timestamps.
    pub fn save(&self, mut definition: SchemaDefinition) -> EngineResult<SchemaDefinition> {
        let now = chrono::Utc::now();
        let mut map = self.lock()?;
        let existing = map.get(&(definition.kind, definition.key.clone()));
        match existing {
            Some(previous) => {
                definition.id = previous.id;
                definition.created_at = previous.created_at;
            }
            None => {
                definition.id = Some(uuid::Uuid::new_v4());
                definition.created_at = Some(now);
            }
        }
        definition.updated_at = Some(now);

        self.db_ops.store_definition(&definition)?;
        map.insert(
            (definition.kind, definition.key.clone()),
            definition.clone(),
        );
        info!("saved {} definition '{}'", definition.kind, definition.key);
        Ok(definition)
    }

    /// Snapshot of one definition, active or not.
    pub fn get(&self, kind: SchemaKind, key: &str) -> EngineResult<Option<SchemaDefinition>> {
        Ok(self.lock()?.get(&(kind, key.to_string())).cloned())
    }

    pub fn delete(&self, kind: SchemaKind, key: &str) -> EngineResult<bool> {
        let mut map = self.lock()?;
        let existed = self.db_ops.delete_definition(kind, key)?;
        map.remove(&(kind, key.to_string()));
        if existed {
            info!("deleted {} definition '{}'", kind, key);
        }
        Ok(existed)
    }

    /// Flips the active flag; inactive definitions stay stored and listable
    /// by administrators but disappear from caller-facing listings.
    ///
    /// The registry entry is replaced only after the write succeeds, so a
    /// store failure never leaves memory ahead of disk.
    pub fn set_active(&self, kind: SchemaKind, key: &str, active: bool) -> EngineResult<()> {
        let mut map = self.lock()?;
        let mut definition = map
            .get(&(kind, key.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                kind,
                key: key.to_string(),
            })?;
        definition.is_active = active;
        definition.updated_at = Some(chrono::Utc::now());
        self.db_ops.store_definition(&definition)?;
        map.insert((kind, key.to_string()), definition);
        Ok(())
    }

    /// Active definitions of one kind, ordered by `sort_order` then key.
    pub fn list(&self, kind: SchemaKind) -> EngineResult<Vec<SchemaDefinition>> {
        let map = self.lock()?;
        let mut definitions: Vec<SchemaDefinition> = map
            .values()
            .filter(|d| d.kind == kind && d.is_active)
            .cloned()
            .collect();
        definitions.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(definitions)
    }

    /// Every stored definition of one kind, inactive included, for
    /// administrative listings.
    pub fn list_all(&self, kind: SchemaKind) -> EngineResult<Vec<SchemaDefinition>> {
        let map = self.lock()?;
        let mut definitions: Vec<SchemaDefinition> = map
            .values()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect();
        definitions.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(definitions)
    }
}
