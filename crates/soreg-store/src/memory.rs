//! In-memory document store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use soreg_core::{Collection, DocumentStore, FieldChange, Filter, FindOptions, StoreResult};
use tracing::debug;

use crate::table::Table;

/// Document store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Collection, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .get(&collection)
            .map(|t| t.docs().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Value) -> StoreResult<String> {
        let id = self.tables.write().entry(collection).or_default().insert(doc)?;
        debug!(%collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read();
        Ok(tables
            .get(&collection)
            .map(|t| t.find(filter, &options))
            .unwrap_or_default())
    }

    async fn replace(&self, collection: Collection, id: &str, doc: Value) -> StoreResult<bool> {
        self.tables
            .write()
            .entry(collection)
            .or_default()
            .replace(id, doc)
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        changes: &[FieldChange],
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        Ok(tables
            .get_mut(&collection)
            .map(|t| t.update_many(filter, changes))
            .unwrap_or(0))
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let removed = tables
            .get_mut(&collection)
            .map(|t| t.delete(filter))
            .unwrap_or(0);
        debug!(%collection, removed, "Deleted documents");
        Ok(removed)
    }
}
