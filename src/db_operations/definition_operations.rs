use super::core::DbOperations;
use crate::error::EngineResult;
use crate::schema::types::{SchemaDefinition, SchemaKind};

impl DbOperations {
    /// Stores a definition under its kind's tree, replacing any previous
    /// version with the same key.
    pub fn store_definition(&self, definition: &SchemaDefinition) -> EngineResult<()> {
        self.store_in_tree(self.tree_for(definition.kind), &definition.key, definition)
    }

    pub fn get_definition(
        &self,
        kind: SchemaKind,
        key: &str,
    ) -> EngineResult<Option<SchemaDefinition>> {
        self.get_from_tree(self.tree_for(kind), key)
    }

    /// All persisted definitions of one kind, in key order.
    pub fn list_definitions(&self, kind: SchemaKind) -> EngineResult<Vec<SchemaDefinition>> {
        let items: Vec<(String, SchemaDefinition)> =
            self.list_items_in_tree(self.tree_for(kind))?;
        Ok(items.into_iter().map(|(_, definition)| definition).collect())
    }

    pub fn delete_definition(&self, kind: SchemaKind, key: &str) -> EngineResult<bool> {
        self.delete_from_tree(self.tree_for(kind), key)
    }
}
