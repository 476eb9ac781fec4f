//! soreg-registry - Service Object registry
//!
//! [`Repository`] is the only component callers talk to. It sequences
//! shape conversion, gateway resolution, referential checks, schema
//! validation and persistence over an injected [`DocumentStore`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use soreg_registry::Repository;
//! use soreg_store::MemoryStore;
//!
//! # async fn demo() -> Result<(), soreg_core::RegistryError> {
//! let repo = Repository::new(Arc::new(MemoryStore::new()));
//! let created = repo
//!     .add_service_object(
//!         "u1",
//!         &json!({
//!             "streams": {"s1": {"channels": {"c1": {"type": "number", "unit": "C"}}}},
//!             "gateway": {"name": "GW1", "URL": "http://x"}
//!         }),
//!     )
//!     .await?;
//! repo.add_sensor_data(
//!     "u1",
//!     &created.so_id,
//!     "s1",
//!     &json!({"channels": {"c1": {"current-value": 21.5}}, "lastUpdate": 1000}),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`DocumentStore`]: soreg_core::DocumentStore

pub mod config;
mod document;
pub mod referential;
pub mod resolver;
pub mod repository;

pub use config::{ConfigError, FileStorageConfig, RegistryConfig, SensorDataConfig, StorageConfig};
pub use referential::StreamValidator;
pub use repository::Repository;
pub use resolver::{parse_descriptor, GatewayResolver, Resolution};
