//! soreg-core - Core types for the Service Object registry
//!
//! This crate provides the entity models (Gateway, Service Object, Sensor Data),
//! their structural schemas, the error taxonomy shared by every layer, and the
//! `DocumentStore` abstraction that storage backends implement.

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{
    EntityKind, FieldViolation, RegistryError, RegistryResult, StoreError, StoreResult,
    ValidationFailure,
};
pub use models::*;
pub use store::{Collection, DocumentStore, FieldChange, Filter, FindOptions, SortOrder, ID_FIELD};
