use serde::{de::DeserializeOwned, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::schema::types::SchemaKind;

/// Unified access to the sled database. Definitions live in one tree per
/// kind so listing a kind never scans the others.
#[derive(Clone)]
pub struct DbOperations {
    pub(crate) form_definitions_tree: sled::Tree,
    pub(crate) table_definitions_tree: sled::Tree,
    pub(crate) report_definitions_tree: sled::Tree,
}

impl DbOperations {
    pub fn new(db: sled::Db) -> Result<Self, sled::Error> {
        let form_definitions_tree = db.open_tree("form_definitions")?;
        let table_definitions_tree = db.open_tree("table_definitions")?;
        let report_definitions_tree = db.open_tree("report_definitions")?;

        Ok(Self {
            form_definitions_tree,
            table_definitions_tree,
            report_definitions_tree,
        })
    }

    pub(crate) fn tree_for(&self, kind: SchemaKind) -> &sled::Tree {
        match kind {
            SchemaKind::Form => &self.form_definitions_tree,
            SchemaKind::Table => &self.table_definitions_tree,
            SchemaKind::Report => &self.report_definitions_tree,
        }
    }

    /// Stores a serializable item in a tree and flushes so the write is
    /// durable before the call returns.
    pub fn store_in_tree<T: Serialize>(
        &self,
        tree: &sled::Tree,
        key: &str,
        item: &T,
    ) -> EngineResult<()> {
        let bytes = serde_json::to_vec(item)
            .map_err(|e| EngineError::store(format!("serialization failed: {}", e)))?;

        tree.insert(key.as_bytes(), bytes)
            .map_err(|e| EngineError::store(format!("store failed: {}", e)))?;

        tree.flush()
            .map_err(|e| EngineError::store(format!("flush failed: {}", e)))?;

        Ok(())
    }

    pub fn get_from_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        key: &str,
    ) -> EngineResult<Option<T>> {
        match tree.get(key.as_bytes()) {
            Ok(Some(bytes)) => {
                let item = serde_json::from_slice(&bytes)
                    .map_err(|e| EngineError::store(format!("deserialization failed: {}", e)))?;
                Ok(Some(item))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(EngineError::store(format!("retrieval failed: {}", e))),
        }
    }

    pub fn list_items_in_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
    ) -> EngineResult<Vec<(String, T)>> {
        let mut items = Vec::new();
        for result in tree.iter() {
            let (key, value) = result
                .map_err(|e| EngineError::store(format!("tree iteration failed: {}", e)))?;
            let key_str = String::from_utf8_lossy(&key).to_string();
            let item = serde_json::from_slice(&value).map_err(|e| {
                EngineError::store(format!(
                    "deserialization failed for key '{}': {}",
                    key_str, e
                ))
            })?;
            items.push((key_str, item));
        }
        Ok(items)
    }

    pub fn delete_from_tree(&self, tree: &sled::Tree, key: &str) -> EngineResult<bool> {
        let existed = tree
            .remove(key.as_bytes())
            .map_err(|e| EngineError::store(format!("delete failed: {}", e)))?
            .is_some();

        tree.flush()
            .map_err(|e| EngineError::store(format!("flush failed: {}", e)))?;

        Ok(existed)
    }
}
