//! Helpers for moving between stored documents and typed models

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use soreg_core::{Collection, RegistryResult, StoreError, ID_FIELD};

/// Decode a stored document into its typed model.
///
/// A stored document that no longer matches the model is a store fault,
/// not a caller error.
pub(crate) fn decode<T: DeserializeOwned>(collection: Collection, doc: Value) -> RegistryResult<T> {
    serde_json::from_value(doc).map_err(|e| {
        StoreError::Corrupt(format!("invalid document in {}: {}", collection, e)).into()
    })
}

/// Encode a validated model as a document
pub(crate) fn encode<T: Serialize>(entity: &T) -> RegistryResult<Value> {
    serde_json::to_value(entity).map_err(|e| StoreError::Json(e).into())
}

/// Identifier of a stored document
pub(crate) fn id_of(doc: &Value) -> Option<String> {
    doc.get(ID_FIELD).and_then(Value::as_str).map(str::to_string)
}

/// Identifiers of a result set, skipping documents without one
pub(crate) fn ids_of(docs: &[Value]) -> Vec<String> {
    docs.iter().filter_map(id_of).collect()
}

/// Candidate write payload as a mutable object.
///
/// Non-object payloads yield an empty object with the original value kept
/// aside, so that schema validation still reports the root type error.
pub(crate) struct Candidate {
    fields: Map<String, Value>,
    original: Option<Value>,
}

impl Candidate {
    pub(crate) fn new(payload: Value) -> Self {
        match payload {
            Value::Object(fields) => Self {
                fields,
                original: None,
            },
            other => Self {
                fields: Map::new(),
                original: Some(other),
            },
        }
    }

    pub(crate) fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub(crate) fn take(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub(crate) fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub(crate) fn set_opt(&mut self, field: &str, value: Option<&str>) {
        match value {
            Some(v) => self.set(field, v),
            None => {
                self.fields.remove(field);
            }
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self.original {
            Some(original) => original,
            None => Value::Object(self.fields),
        }
    }
}
