//! Insertion-ordered document table shared by the store implementations

use serde_json::Value;
use soreg_core::{FieldChange, Filter, FindOptions, StoreError, StoreResult, ID_FIELD};

use crate::generate_id;

/// One collection's documents, in insertion order
#[derive(Debug, Default, Clone)]
pub(crate) struct Table {
    docs: Vec<Value>,
}

impl Table {
    pub(crate) fn from_docs(docs: Vec<Value>) -> Self {
        Self { docs }
    }

    pub(crate) fn docs(&self) -> &[Value] {
        &self.docs
    }

    pub(crate) fn insert(&mut self, mut doc: Value) -> StoreResult<String> {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::Corrupt("document must be a JSON object".to_string()))?;
        let id = generate_id();
        obj.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        self.docs.push(doc);
        Ok(id)
    }

    pub(crate) fn find(&self, filter: &Filter, options: &FindOptions) -> Vec<Value> {
        let matched = self
            .docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        options.apply(matched)
    }

    pub(crate) fn replace(&mut self, id: &str, mut doc: Value) -> StoreResult<bool> {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::Corrupt("document must be a JSON object".to_string()))?;
        obj.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let by_id = Filter::by_id(id);
        match self.docs.iter_mut().find(|d| by_id.matches(d)) {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn update_many(&mut self, filter: &Filter, changes: &[FieldChange]) -> u64 {
        let mut count = 0;
        for doc in self.docs.iter_mut().filter(|d| filter.matches(d)) {
            for change in changes {
                // Identifiers are never rewritten
                if matches!(change, FieldChange::Set(f, _) | FieldChange::Unset(f) if f == ID_FIELD)
                {
                    continue;
                }
                change.apply(doc);
            }
            count += 1;
        }
        count
    }

    pub(crate) fn delete(&mut self, filter: &Filter) -> u64 {
        let before = self.docs.len();
        self.docs.retain(|d| !filter.matches(d));
        (before - self.docs.len()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soreg_core::SortOrder;

    #[test]
    fn test_insert_overwrites_client_id() {
        let mut table = Table::default();
        let id = table.insert(json!({"id": "mine", "name": "a"})).unwrap();
        assert_ne!(id, "mine");
        assert_eq!(table.docs()[0]["id"], json!(id));
    }

    #[test]
    fn test_insert_rejects_non_object() {
        let mut table = Table::default();
        assert!(matches!(
            table.insert(json!([1])),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_replace_preserves_id() {
        let mut table = Table::default();
        let id = table.insert(json!({"name": "a"})).unwrap();
        assert!(table.replace(&id, json!({"id": "other", "name": "b"})).unwrap());
        assert_eq!(table.docs()[0], json!({"id": id, "name": "b"}));
        assert!(!table.replace("missing", json!({})).unwrap());
    }

    #[test]
    fn test_update_many_and_delete() {
        let mut table = Table::default();
        table.insert(json!({"gatewayID": "g1"})).unwrap();
        table.insert(json!({"gatewayID": "g1"})).unwrap();
        table.insert(json!({"gatewayID": "g2"})).unwrap();

        let filter = Filter::new().eq("gatewayID", "g1");
        let changed = table.update_many(
            &filter,
            &[FieldChange::Unset("gatewayID".into()), FieldChange::Unset("id".into())],
        );
        assert_eq!(changed, 2);
        assert!(table.docs().iter().all(|d| d.get("id").is_some()));
        assert_eq!(table.find(&filter, &FindOptions::default()).len(), 0);

        assert_eq!(table.delete(&Filter::new().eq("gatewayID", "g2")), 1);
        assert_eq!(table.docs().len(), 2);
    }

    #[test]
    fn test_find_sorted() {
        let mut table = Table::default();
        for ts in [5, 9, 1] {
            table.insert(json!({"lastUpdate": ts})).unwrap();
        }
        let out = table.find(
            &Filter::new(),
            &FindOptions::sorted_by("lastUpdate", SortOrder::Ascending),
        );
        let ts: Vec<i64> = out.iter().filter_map(|d| d["lastUpdate"].as_i64()).collect();
        assert_eq!(ts, vec![1, 5, 9]);
    }
}
