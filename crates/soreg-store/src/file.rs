//! File-backed document store
//!
//! Layout: `<root>/<collection>.json`, each a JSON array of documents.
//! Every mutation rewrites the affected collection through a temporary
//! file followed by a rename, so a crash leaves either the old or the new
//! file, never a partial one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use soreg_core::{
    Collection, DocumentStore, FieldChange, Filter, FindOptions, StoreError, StoreResult,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::table::Table;

/// Document store persisted as JSON files in a directory
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tables: Mutex<HashMap<Collection, Table>>,
}

impl FileStore {
    /// Open (or create) a store rooted at `root`
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        let mut tables = HashMap::new();
        for collection in Collection::ALL {
            let table = load_table(&collection_path(&root, collection)).await?;
            debug!(%collection, docs = table.docs().len(), "Loaded collection");
            tables.insert(collection, table);
        }

        info!(path = %root.display(), "Opened file store");
        Ok(Self {
            root,
            tables: Mutex::new(tables),
        })
    }

    async fn persist(&self, collection: Collection, table: &Table) -> StoreResult<()> {
        let path = collection_path(&self.root, collection);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(table.docs())?;

        let result = async {
            tokio::fs::write(&tmp, &body).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = result {
            warn!(%collection, path = %path.display(), error = %e, "Failed to persist collection");
            return Err(StoreError::Io(e));
        }
        Ok(())
    }
}

fn collection_path(root: &Path, collection: Collection) -> PathBuf {
    root.join(format!("{}.json", collection.name()))
}

async fn load_table(path: &Path) -> StoreResult<Table> {
    let content = match tokio::fs::read(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Table::default()),
        Err(e) => return Err(StoreError::Io(e)),
    };

    match serde_json::from_slice::<Value>(&content)? {
        Value::Array(docs) if docs.iter().all(Value::is_object) => Ok(Table::from_docs(docs)),
        _ => Err(StoreError::Corrupt(format!(
            "{} must contain a JSON array of objects",
            path.display()
        ))),
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn insert(&self, collection: Collection, doc: Value) -> StoreResult<String> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(collection).or_default();
        let mut next = table.clone();
        let id = next.insert(doc)?;
        self.persist(collection, &next).await?;
        *table = next;
        debug!(%collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&collection)
            .map(|t| t.find(filter, &options))
            .unwrap_or_default())
    }

    async fn replace(&self, collection: Collection, id: &str, doc: Value) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(collection).or_default();
        let mut next = table.clone();
        if !next.replace(id, doc)? {
            return Ok(false);
        }
        self.persist(collection, &next).await?;
        *table = next;
        Ok(true)
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        changes: &[FieldChange],
    ) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(collection).or_default();
        let mut next = table.clone();
        let count = next.update_many(filter, changes);
        if count > 0 {
            self.persist(collection, &next).await?;
            *table = next;
        }
        Ok(count)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(collection).or_default();
        let mut next = table.clone();
        let removed = next.delete(filter);
        if removed > 0 {
            self.persist(collection, &next).await?;
            *table = next;
        }
        debug!(%collection, removed, "Deleted documents");
        Ok(removed)
    }
}
