//! Entity Repository - the single entry point for registry operations
//!
//! Every write follows the same sequence:
//!
//! ```text
//! external payload → internal shape → [gateway resolution] → schema → store
//! ```
//!
//! Sensor data writes additionally confirm the target stream before the
//! payload is validated.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use soreg_core::{
    schema, Collection, DataModifier, DocumentStore, EntityKind, FieldChange, Filter, FindOptions,
    Gateway, RegistryError, RegistryResult, SensorData, ServiceObject, ServiceObjectCreated,
    ServiceObjectUpdated, SortOrder, ID_FIELD,
};
use soreg_conv::{sensor_data, service_object};
use tracing::{debug, info};

use crate::config::{ConfigError, RegistryConfig};
use crate::document::{decode, encode, ids_of, Candidate};
use crate::referential::StreamValidator;
use crate::resolver::{parse_descriptor, GatewayResolver, DESCRIPTOR_FIELD};

const OWNER: &str = "owner";
const GATEWAY_ID: &str = "gatewayID";
const API_TOKEN: &str = "api_token";
const SO_ID: &str = "soID";
const STREAM: &str = "stream";
const LAST_UPDATE: &str = "lastUpdate";

/// Registry over an injected document store
pub struct Repository {
    store: Arc<dyn DocumentStore>,
    resolver: GatewayResolver,
    streams: StreamValidator,
    default_modifier: DataModifier,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, &RegistryConfig::default())
    }

    /// Repository over `store` using the read defaults from `config`
    pub fn with_config(store: Arc<dyn DocumentStore>, config: &RegistryConfig) -> Self {
        Self {
            resolver: GatewayResolver::new(store.clone()),
            streams: StreamValidator::new(store.clone()),
            store,
            default_modifier: config.sensor_data.default_modifier,
        }
    }

    /// Open the configured store and build a repository over it
    pub async fn from_config(config: &RegistryConfig) -> Result<Self, ConfigError> {
        let store = config.open_store().await?;
        Ok(Self::with_config(store, config))
    }

    // =========================================================================
    // Service Objects
    // =========================================================================

    /// Validate a Service Object payload without resolving or persisting it
    pub async fn validate_service_object_syntax(
        &self,
        owner: &str,
        payload: &Value,
    ) -> RegistryResult<()> {
        let mut candidate = Candidate::new(service_object::to_internal(payload));
        parse_descriptor(candidate.take(DESCRIPTOR_FIELD).as_ref())?;
        candidate.take(ID_FIELD);
        candidate.take(GATEWAY_ID);
        candidate.set(OWNER, owner);
        schema::validate_service_object(&candidate.into_value())?;
        Ok(())
    }

    /// Register a new Service Object owned by `owner`
    pub async fn add_service_object(
        &self,
        owner: &str,
        payload: &Value,
    ) -> RegistryResult<ServiceObjectCreated> {
        let mut candidate = Candidate::new(service_object::to_internal(payload));
        let descriptor = parse_descriptor(candidate.take(DESCRIPTOR_FIELD).as_ref())?;
        let resolution = self.resolver.resolve(owner, descriptor.as_ref()).await?;

        let api_token = generate_api_token();
        candidate.take(ID_FIELD);
        candidate.set(OWNER, owner);
        candidate.set_opt(GATEWAY_ID, resolution.gateway_id());
        candidate.set(API_TOKEN, api_token.as_str());

        let so = schema::validate_service_object(&candidate.into_value())?;
        let so_id = self
            .store
            .insert(Collection::ServiceObjects, encode(&so)?)
            .await?;

        info!(so_id = %so_id, owner = %owner, gateway_id = ?so.gateway_id, "Registered service object");
        Ok(ServiceObjectCreated {
            so_id,
            gateway_id: so.gateway_id,
            api_token,
        })
    }

    /// Replace a Service Object's description, keeping its id and owner
    pub async fn update_service_object(
        &self,
        so_id: &str,
        payload: &Value,
    ) -> RegistryResult<ServiceObjectUpdated> {
        let prior: ServiceObject = self
            .find_by_id(Collection::ServiceObjects, so_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(EntityKind::ServiceObject, so_id))?;

        let mut candidate = Candidate::new(service_object::to_internal(payload));
        let descriptor = parse_descriptor(candidate.take(DESCRIPTOR_FIELD).as_ref())?;
        let resolution = self
            .resolver
            .resolve_for_update(&prior.owner, descriptor.as_ref(), prior.gateway_id.as_deref())
            .await?;

        candidate.take(ID_FIELD);
        candidate.set(OWNER, prior.owner.as_str());
        candidate.set_opt(GATEWAY_ID, resolution.gateway_id());
        let supplied_token = candidate
            .get(API_TOKEN)
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        if !supplied_token {
            candidate.set_opt(API_TOKEN, prior.api_token.as_deref());
        }

        let so = schema::validate_service_object(&candidate.into_value())?;
        if !self
            .store
            .replace(Collection::ServiceObjects, so_id, encode(&so)?)
            .await?
        {
            return Err(RegistryError::not_found(EntityKind::ServiceObject, so_id));
        }

        info!(so_id = %so_id, gateway_id = ?so.gateway_id, "Updated service object");
        Ok(ServiceObjectUpdated {
            so_id: so_id.to_string(),
            gateway_id: so.gateway_id,
        })
    }

    /// Service Object in the external (map-based) shape
    pub async fn get_service_object(&self, so_id: &str) -> RegistryResult<Option<Value>> {
        let doc = self
            .store
            .find_one(Collection::ServiceObjects, &Filter::by_id(so_id))
            .await?;
        Ok(doc.map(|d| service_object::to_external(&d)))
    }

    pub async fn remove_service_object(&self, so_id: &str) -> RegistryResult<()> {
        let removed = self
            .store
            .delete(Collection::ServiceObjects, &Filter::by_id(so_id))
            .await?;
        if removed == 0 {
            return Err(RegistryError::not_found(EntityKind::ServiceObject, so_id));
        }
        info!(so_id = %so_id, "Removed service object");
        Ok(())
    }

    pub async fn get_all_so_for_owner(&self, owner: &str) -> RegistryResult<Vec<String>> {
        let filter = Filter::new().eq(OWNER, owner);
        self.find_ids(Collection::ServiceObjects, &filter, || {
            format!("no service objects for owner {}", owner)
        })
        .await
    }

    /// Identifiers of Service Objects hosted by a gateway
    pub async fn get_all_so_for_gateway(&self, gateway_id: &str) -> RegistryResult<Vec<String>> {
        if self.get_gateway(gateway_id).await?.is_none() {
            return Err(RegistryError::not_found(EntityKind::Gateway, gateway_id));
        }
        let filter = Filter::new().eq(GATEWAY_ID, gateway_id);
        self.find_ids(Collection::ServiceObjects, &filter, || {
            format!("no service objects for gateway {}", gateway_id)
        })
        .await
    }

    // =========================================================================
    // Gateways
    // =========================================================================

    pub async fn validate_gateway_syntax(&self, owner: &str, payload: &Value) -> RegistryResult<()> {
        self.gateway_candidate(owner, payload)?;
        Ok(())
    }

    /// Register a new Gateway owned by `owner`, returning its id
    pub async fn add_gateway(&self, owner: &str, payload: &Value) -> RegistryResult<String> {
        let gateway = self.gateway_candidate(owner, payload)?;
        let id = self
            .store
            .insert(Collection::Gateways, encode(&gateway)?)
            .await?;
        info!(gateway_id = %id, owner = %owner, name = %gateway.name, "Registered gateway");
        Ok(id)
    }

    pub async fn update_gateway(&self, gateway_id: &str, payload: &Value) -> RegistryResult<String> {
        let prior = self
            .get_gateway(gateway_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(EntityKind::Gateway, gateway_id))?;

        let gateway = self.gateway_candidate(&prior.owner, payload)?;
        if !self
            .store
            .replace(Collection::Gateways, gateway_id, encode(&gateway)?)
            .await?
        {
            return Err(RegistryError::not_found(EntityKind::Gateway, gateway_id));
        }
        info!(gateway_id = %gateway_id, "Updated gateway");
        Ok(gateway_id.to_string())
    }

    pub async fn get_gateway(&self, gateway_id: &str) -> RegistryResult<Option<Gateway>> {
        self.find_by_id(Collection::Gateways, gateway_id).await
    }

    /// Remove a Gateway and detach every Service Object that referenced it.
    ///
    /// The two steps are separate store writes. Sensor data is left as is.
    pub async fn remove_gateway(&self, gateway_id: &str) -> RegistryResult<()> {
        let removed = self
            .store
            .delete(Collection::Gateways, &Filter::by_id(gateway_id))
            .await?;
        if removed == 0 {
            return Err(RegistryError::not_found(EntityKind::Gateway, gateway_id));
        }

        let detached = self
            .store
            .update_many(
                Collection::ServiceObjects,
                &Filter::new().eq(GATEWAY_ID, gateway_id),
                &[FieldChange::Unset(GATEWAY_ID.to_string())],
            )
            .await?;
        info!(gateway_id = %gateway_id, detached, "Removed gateway");
        Ok(())
    }

    pub async fn get_all_gateways_for_owner(&self, owner: &str) -> RegistryResult<Vec<String>> {
        let filter = Filter::new().eq(OWNER, owner);
        self.find_ids(Collection::Gateways, &filter, || {
            format!("no gateways for owner {}", owner)
        })
        .await
    }

    fn gateway_candidate(&self, owner: &str, payload: &Value) -> RegistryResult<Gateway> {
        let mut candidate = Candidate::new(payload.clone());
        candidate.take(ID_FIELD);
        candidate.set(OWNER, owner);
        Ok(schema::validate_gateway(&candidate.into_value())?)
    }

    // =========================================================================
    // Sensor Data
    // =========================================================================

    /// Confirm the stream and validate a reading without persisting it
    pub async fn validate_sensor_data_syntax(
        &self,
        owner: &str,
        so_id: &str,
        stream: &str,
        payload: &Value,
    ) -> RegistryResult<()> {
        self.streams.validate_stream(so_id, stream).await?;
        self.sensor_data_candidate(owner, so_id, stream, payload)?;
        Ok(())
    }

    /// Store a reading pushed to `stream` of `so_id`
    pub async fn add_sensor_data(
        &self,
        owner: &str,
        so_id: &str,
        stream: &str,
        payload: &Value,
    ) -> RegistryResult<()> {
        self.streams.validate_stream(so_id, stream).await?;
        let data = self.sensor_data_candidate(owner, so_id, stream, payload)?;
        let id = self
            .store
            .insert(Collection::SensorData, encode(&data)?)
            .await?;
        debug!(id = %id, so_id = %so_id, stream = %stream, last_update = ?data.last_update, "Stored sensor data");
        Ok(())
    }

    /// Remove every reading of a stream
    pub async fn remove_sensor_data(&self, so_id: &str, stream: &str) -> RegistryResult<()> {
        let filter = stream_filter(so_id, stream);
        let removed = self.store.delete(Collection::SensorData, &filter).await?;
        if removed == 0 {
            return Err(RegistryError::NoDataFound(format!(
                "no sensor data for {}/{}",
                so_id, stream
            )));
        }
        info!(so_id = %so_id, stream = %stream, removed, "Removed sensor data");
        Ok(())
    }

    /// Readings of one stream in the external shape.
    ///
    /// `lastUpdate` returns only the most recent reading; anything else
    /// returns all of them in insertion order.
    pub async fn get_sensor_data_for_stream(
        &self,
        so_id: &str,
        stream: &str,
        modifier: Option<&str>,
    ) -> RegistryResult<Vec<Value>> {
        let options = match self.modifier(modifier) {
            DataModifier::All => FindOptions::default(),
            DataModifier::LastUpdate => {
                FindOptions::sorted_by(LAST_UPDATE, SortOrder::Descending).with_limit(1)
            }
        };
        let docs = self
            .store
            .find(Collection::SensorData, &stream_filter(so_id, stream), options)
            .await?;
        if docs.is_empty() {
            return Err(RegistryError::NoDataFound(format!(
                "no sensor data for {}/{}",
                so_id, stream
            )));
        }
        Ok(docs.iter().map(sensor_data::to_external).collect())
    }

    /// Readings pushed by `owner` in the external shape.
    ///
    /// With `lastUpdate`, one reading per (soID, stream) pair, newest first.
    pub async fn get_sensor_data_for_owner(
        &self,
        owner: &str,
        modifier: Option<&str>,
    ) -> RegistryResult<Vec<Value>> {
        let filter = Filter::new().eq(OWNER, owner);
        let docs = match self.modifier(modifier) {
            DataModifier::All => {
                self.store
                    .find(Collection::SensorData, &filter, FindOptions::default())
                    .await?
            }
            DataModifier::LastUpdate => {
                let options = FindOptions::sorted_by(LAST_UPDATE, SortOrder::Descending);
                let docs = self
                    .store
                    .find(Collection::SensorData, &filter, options)
                    .await?;
                latest_per_stream(docs)
            }
        };
        if docs.is_empty() {
            return Err(RegistryError::NoDataFound(format!(
                "no sensor data for owner {}",
                owner
            )));
        }
        Ok(docs.iter().map(sensor_data::to_external).collect())
    }

    fn sensor_data_candidate(
        &self,
        owner: &str,
        so_id: &str,
        stream: &str,
        payload: &Value,
    ) -> RegistryResult<SensorData> {
        let mut candidate = Candidate::new(sensor_data::to_internal(payload));
        candidate.take(ID_FIELD);
        candidate.set(OWNER, owner);
        candidate.set(SO_ID, so_id);
        candidate.set(STREAM, stream);
        Ok(schema::validate_sensor_data(&candidate.into_value())?)
    }

    fn modifier(&self, modifier: Option<&str>) -> DataModifier {
        DataModifier::from_option(modifier, self.default_modifier)
    }

    // =========================================================================
    // Store helpers
    // =========================================================================

    async fn find_by_id<T>(&self, collection: Collection, id: &str) -> RegistryResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.store.find_one(collection, &Filter::by_id(id)).await? {
            Some(doc) => Ok(Some(decode(collection, doc)?)),
            None => Ok(None),
        }
    }

    async fn find_ids(
        &self,
        collection: Collection,
        filter: &Filter,
        empty: impl FnOnce() -> String,
    ) -> RegistryResult<Vec<String>> {
        let docs = self
            .store
            .find(collection, filter, FindOptions::default())
            .await?;
        let ids = ids_of(&docs);
        if ids.is_empty() {
            return Err(RegistryError::NoDataFound(empty()));
        }
        Ok(ids)
    }
}

fn stream_filter(so_id: &str, stream: &str) -> Filter {
    Filter::new().eq(SO_ID, so_id).eq(STREAM, stream)
}

/// Keep the first document of every (soID, stream) pair
fn latest_per_stream(docs: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| {
            let key = (
                doc.get(SO_ID).and_then(Value::as_str).map(str::to_string),
                doc.get(STREAM).and_then(Value::as_str).map(str::to_string),
            );
            seen.insert(key)
        })
        .collect()
}

/// Fresh API token for a new Service Object
fn generate_api_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::id_of;
    use serde_json::json;

    #[test]
    fn test_latest_per_stream_keeps_first() {
        let docs = vec![
            json!({"id": "a", "soID": "so1", "stream": "s1", "lastUpdate": 3}),
            json!({"id": "b", "soID": "so1", "stream": "s2", "lastUpdate": 2}),
            json!({"id": "c", "soID": "so1", "stream": "s1", "lastUpdate": 1}),
            json!({"id": "d", "soID": "so2", "stream": "s1", "lastUpdate": 1}),
        ];
        let kept: Vec<_> = latest_per_stream(docs).iter().filter_map(id_of).collect();
        assert_eq!(kept, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_api_tokens_are_unique() {
        let a = generate_api_token();
        let b = generate_api_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
