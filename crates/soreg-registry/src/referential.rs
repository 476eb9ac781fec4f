//! Referential validation for sensor data writes

use std::sync::Arc;

use soreg_core::{
    Collection, DocumentStore, EntityKind, Filter, RegistryError, RegistryResult, ServiceObject,
};
use tracing::debug;

use crate::document::decode;

/// Confirms that a Service Object and one of its streams exist
pub struct StreamValidator {
    store: Arc<dyn DocumentStore>,
}

impl StreamValidator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Check that `so_id` exists and has a stream named `stream`.
    ///
    /// Returns the Service Object so callers can reuse it.
    pub async fn validate_stream(&self, so_id: &str, stream: &str) -> RegistryResult<ServiceObject> {
        let doc = self
            .store
            .find_one(Collection::ServiceObjects, &Filter::by_id(so_id))
            .await?
            .ok_or_else(|| RegistryError::not_found(EntityKind::ServiceObject, so_id))?;

        let so: ServiceObject = decode(Collection::ServiceObjects, doc)?;
        if !so.has_stream(stream) {
            debug!(so_id = %so_id, stream = %stream, "Stream not declared by service object");
            return Err(RegistryError::StreamNotFound {
                so_id: so_id.to_string(),
                stream: stream.to_string(),
            });
        }
        Ok(so)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soreg_store::MemoryStore;

    async fn setup() -> (StreamValidator, String) {
        let store = Arc::new(MemoryStore::new());
        let so_id = store
            .insert(
                Collection::ServiceObjects,
                json!({
                    "owner": "u1",
                    "streams": [{"name": "s1", "channels": [{"name": "c1", "type": "number", "unit": "C"}]}]
                }),
            )
            .await
            .unwrap();
        (StreamValidator::new(store), so_id)
    }

    #[tokio::test]
    async fn test_known_stream() {
        let (validator, so_id) = setup().await;
        let so = validator.validate_stream(&so_id, "s1").await.unwrap();
        assert_eq!(so.owner, "u1");
    }

    #[tokio::test]
    async fn test_unknown_service_object() {
        let (validator, _) = setup().await;
        let err = validator.validate_stream("missing", "s1").await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotFound {
                kind: EntityKind::ServiceObject,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_stream() {
        let (validator, so_id) = setup().await;
        let err = validator.validate_stream(&so_id, "s2").await.unwrap_err();
        assert!(matches!(err, RegistryError::StreamNotFound { .. }));
    }
}
