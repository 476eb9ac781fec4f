//! DocumentStore trait - the backing store abstraction
//!
//! The registry persists JSON documents into three collections. A store
//! only needs equality filters, a single-field sort, and a limit; all
//! decision logic lives above it in the repository.

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Field that holds the store-generated document identifier
pub const ID_FIELD: &str = "id";

/// Collections managed by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Gateways,
    ServiceObjects,
    SensorData,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Gateways,
        Collection::ServiceObjects,
        Collection::SensorData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Gateways => "gateways",
            Collection::ServiceObjects => "service_objects",
            Collection::SensorData => "sensor_data",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conjunction of top-level field equality conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching the document with this identifier
    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Add an equality condition only when a value is present
    pub fn eq_opt(self, field: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether a document satisfies every condition. A missing field never
    /// equals a value.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Sort and limit options for `find`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn sorted_by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort: Some((field.into(), order)),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply sort and limit to an already-filtered result set
    pub fn apply(&self, mut docs: Vec<Value>) -> Vec<Value> {
        if let Some((field, order)) = &self.sort {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

/// Ordering used for sorting: missing < numbers < strings < everything else
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A single-field modification applied by `update_many`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Set(String, Value),
    Unset(String),
}

impl FieldChange {
    /// Apply to a JSON object document; non-objects are left untouched
    pub fn apply(&self, doc: &mut Value) {
        if let Some(obj) = doc.as_object_mut() {
            match self {
                FieldChange::Set(field, value) => {
                    obj.insert(field.clone(), value.clone());
                }
                FieldChange::Unset(field) => {
                    obj.remove(field);
                }
            }
        }
    }
}

/// The backing document store.
///
/// Single-document writes are atomic; sequences of calls are not.
/// Implementations generate identifiers on `insert` and must never accept
/// client-supplied ones.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning its newly generated identifier
    async fn insert(&self, collection: Collection, doc: Value) -> StoreResult<String>;

    /// Return every document matching the filter
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>>;

    /// Return the first document matching the filter
    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Value>> {
        let mut docs = self
            .find(collection, filter, FindOptions::default().with_limit(1))
            .await?;
        Ok(docs.pop())
    }

    /// Replace a document by identifier. Returns false if it does not exist.
    async fn replace(&self, collection: Collection, id: &str, doc: Value) -> StoreResult<bool>;

    /// Apply field changes to every matching document, returning the count
    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        changes: &[FieldChange],
    ) -> StoreResult<u64>;

    /// Delete every matching document, returning the count
    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<u64>;
}
