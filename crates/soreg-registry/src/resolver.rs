//! Gateway Resolver - turns an embedded gateway descriptor into a gateway id
//!
//! Resolution priority:
//!
//! ```text
//! descriptor?
//!   ├─ none ─────────────────────────────► no association
//!   ├─ gatewayID (+ name/URL narrowing) ─► lookup by id ──► found: reuse
//!   │                                                  └─► miss: NotFound
//!   └─ name + URL ───────────────────────► lookup pair ──► found: reuse
//!                                                      └─► miss: create
//! ```
//!
//! On update, a descriptor whose `gatewayID` equals the stored reference
//! keeps the association without any lookup.

use std::sync::Arc;

use serde_json::Value;
use soreg_core::{
    schema, Collection, DocumentStore, EntityKind, Filter, Gateway, GatewayDescriptor,
    RegistryError, RegistryResult, ValidationFailure,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::document::{encode, id_of};

/// Field carrying the transient descriptor in Service Object payloads
pub const DESCRIPTOR_FIELD: &str = "gateway";

/// Outcome of gateway resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No descriptor: the Service Object has no gateway
    Detached,
    /// Descriptor matched the stored reference; nothing was looked up
    Unchanged(String),
    /// Found by identifier
    ById(String),
    /// Found by (name, URL)
    ByEndpoint(String),
    /// No match: a new gateway was created
    Created(String),
}

impl Resolution {
    pub fn gateway_id(&self) -> Option<&str> {
        match self {
            Resolution::Detached => None,
            Resolution::Unchanged(id)
            | Resolution::ById(id)
            | Resolution::ByEndpoint(id)
            | Resolution::Created(id) => Some(id),
        }
    }
}

/// Extract the descriptor from an internal-shape payload field.
///
/// `null` or absent means no descriptor. Without a `gatewayID`, both
/// `name` and `URL` are required.
pub fn parse_descriptor(value: Option<&Value>) -> Result<Option<GatewayDescriptor>, ValidationFailure> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    let descriptor: GatewayDescriptor = serde_json::from_value(value.clone()).map_err(|e| {
        ValidationFailure::single(DESCRIPTOR_FIELD, "type", e.to_string())
    })?;

    let has_id = descriptor.gateway_id.as_deref().is_some_and(|id| !id.is_empty());
    let has_endpoint = descriptor.name.as_deref().is_some_and(|n| !n.is_empty())
        && descriptor.url.as_deref().is_some_and(|u| !u.is_empty());

    if !has_id && !has_endpoint {
        return Err(ValidationFailure::single(
            DESCRIPTOR_FIELD,
            "required",
            "either gatewayID or both name and URL are required",
        ));
    }
    Ok(Some(descriptor))
}

/// Resolves gateway descriptors against stored Gateway records
pub struct GatewayResolver {
    store: Arc<dyn DocumentStore>,
    /// Serializes the find-then-create sequence within this process
    create_lock: Mutex<()>,
}

impl GatewayResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Resolve a descriptor for a new Service Object owned by `owner`
    pub async fn resolve(
        &self,
        owner: &str,
        descriptor: Option<&GatewayDescriptor>,
    ) -> RegistryResult<Resolution> {
        let Some(descriptor) = descriptor else {
            return Ok(Resolution::Detached);
        };

        match descriptor.gateway_id.as_deref().filter(|id| !id.is_empty()) {
            Some(gateway_id) => self.resolve_by_id(gateway_id, descriptor).await,
            None => self.resolve_by_endpoint(owner, descriptor).await,
        }
    }

    /// Resolve a descriptor for an existing Service Object whose stored
    /// gateway reference is `current`
    pub async fn resolve_for_update(
        &self,
        owner: &str,
        descriptor: Option<&GatewayDescriptor>,
        current: Option<&str>,
    ) -> RegistryResult<Resolution> {
        if let (Some(descriptor), Some(current)) = (descriptor, current) {
            if descriptor.gateway_id.as_deref() == Some(current) {
                debug!(gateway_id = %current, "Gateway reference unchanged");
                return Ok(Resolution::Unchanged(current.to_string()));
            }
        }
        self.resolve(owner, descriptor).await
    }

    async fn resolve_by_id(
        &self,
        gateway_id: &str,
        descriptor: &GatewayDescriptor,
    ) -> RegistryResult<Resolution> {
        let filter = Filter::by_id(gateway_id)
            .eq_opt("name", descriptor.name.as_deref())
            .eq_opt("URL", descriptor.url.as_deref());

        match self.store.find_one(Collection::Gateways, &filter).await? {
            Some(doc) => {
                let id = id_of(&doc).unwrap_or_else(|| gateway_id.to_string());
                debug!(gateway_id = %id, "Resolved gateway by id");
                Ok(Resolution::ById(id))
            }
            None => {
                debug!(gateway_id = %gateway_id, "Gateway reference does not resolve");
                Err(RegistryError::not_found(EntityKind::Gateway, gateway_id))
            }
        }
    }

    async fn resolve_by_endpoint(
        &self,
        owner: &str,
        descriptor: &GatewayDescriptor,
    ) -> RegistryResult<Resolution> {
        let name = descriptor.name.clone().unwrap_or_default();
        let url = descriptor.url.clone().unwrap_or_default();
        let filter = Filter::new().eq("name", name.as_str()).eq("URL", url.as_str());

        let _guard = self.create_lock.lock().await;

        if let Some(doc) = self.store.find_one(Collection::Gateways, &filter).await? {
            if let Some(id) = id_of(&doc) {
                debug!(gateway_id = %id, name = %name, url = %url, "Resolved gateway by endpoint");
                return Ok(Resolution::ByEndpoint(id));
            }
        }

        let gateway = Gateway::new(owner, name, url);
        let gateway = schema::validate_gateway(&encode(&gateway)?)?;
        let id = self
            .store
            .insert(Collection::Gateways, encode(&gateway)?)
            .await?;
        info!(gateway_id = %id, owner = %owner, name = %gateway.name, "Created gateway for service object");
        Ok(Resolution::Created(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soreg_store::MemoryStore;

    async fn store_with_gateway() -> (Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .insert(
                Collection::Gateways,
                json!({"owner": "u0", "name": "GW1", "URL": "http://x"}),
            )
            .await
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_parse_descriptor_shapes() {
        assert_eq!(parse_descriptor(None).unwrap(), None);
        assert_eq!(parse_descriptor(Some(&json!(null))).unwrap(), None);
        assert_eq!(
            parse_descriptor(Some(&json!({"name": "GW1", "URL": "http://x"}))).unwrap(),
            Some(GatewayDescriptor::by_endpoint("GW1", "http://x"))
        );
        assert_eq!(
            parse_descriptor(Some(&json!({"gatewayID": "g1"}))).unwrap(),
            Some(GatewayDescriptor::by_id("g1"))
        );

        let failure = parse_descriptor(Some(&json!({"name": "GW1"}))).unwrap_err();
        assert!(failure.has_field(DESCRIPTOR_FIELD));
        assert!(parse_descriptor(Some(&json!("GW1"))).is_err());
        assert!(parse_descriptor(Some(&json!({}))).is_err());
    }

    #[tokio::test]
    async fn test_no_descriptor_detaches() {
        let (store, _) = store_with_gateway().await;
        let resolver = GatewayResolver::new(store);
        assert_eq!(resolver.resolve("u1", None).await.unwrap(), Resolution::Detached);
    }

    #[tokio::test]
    async fn test_by_id_with_narrowing() {
        let (store, id) = store_with_gateway().await;
        let resolver = GatewayResolver::new(store);

        let mut descriptor = GatewayDescriptor::by_id(id.clone());
        descriptor.name = Some("GW1".into());
        assert_eq!(
            resolver.resolve("u1", Some(&descriptor)).await.unwrap(),
            Resolution::ById(id.clone())
        );

        descriptor.name = Some("other".into());
        let err = resolver.resolve("u1", Some(&descriptor)).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotFound {
                kind: EntityKind::Gateway,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_id_miss_never_creates() {
        let (store, _) = store_with_gateway().await;
        let resolver = GatewayResolver::new(store.clone());

        let descriptor = GatewayDescriptor {
            gateway_id: Some("nope".into()),
            name: Some("GW9".into()),
            url: Some("http://y".into()),
        };
        assert!(resolver.resolve("u1", Some(&descriptor)).await.is_err());
        assert_eq!(store.len(Collection::Gateways), 1);
    }

    #[tokio::test]
    async fn test_endpoint_match_reuses_any_owner() {
        let (store, id) = store_with_gateway().await;
        let resolver = GatewayResolver::new(store.clone());

        let descriptor = GatewayDescriptor::by_endpoint("GW1", "http://x");
        assert_eq!(
            resolver.resolve("u1", Some(&descriptor)).await.unwrap(),
            Resolution::ByEndpoint(id)
        );
        assert_eq!(store.len(Collection::Gateways), 1);
    }

    #[tokio::test]
    async fn test_endpoint_miss_creates_with_owner() {
        let (store, _) = store_with_gateway().await;
        let resolver = GatewayResolver::new(store.clone());

        let descriptor = GatewayDescriptor::by_endpoint("GW2", "http://x");
        let resolution = resolver.resolve("u1", Some(&descriptor)).await.unwrap();
        let Resolution::Created(id) = resolution else {
            panic!("expected a created gateway, got {:?}", resolution);
        };

        let doc = store
            .find_one(Collection::Gateways, &Filter::by_id(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["owner"], json!("u1"));
        assert_eq!(doc["name"], json!("GW2"));
        assert_eq!(store.len(Collection::Gateways), 2);
    }

    #[tokio::test]
    async fn test_update_short_circuit() {
        let store = Arc::new(MemoryStore::new());
        let resolver = GatewayResolver::new(store);

        // The stored reference is dangling, yet the no-op update keeps it
        let mut descriptor = GatewayDescriptor::by_id("g-old");
        descriptor.name = Some("renamed".into());
        assert_eq!(
            resolver
                .resolve_for_update("u1", Some(&descriptor), Some("g-old"))
                .await
                .unwrap(),
            Resolution::Unchanged("g-old".into())
        );

        assert_eq!(
            resolver
                .resolve_for_update("u1", None, Some("g-old"))
                .await
                .unwrap(),
            Resolution::Detached
        );
    }
}
