//! soreg-store - DocumentStore implementations
//!
//! - [`MemoryStore`] keeps every collection in process memory. Used for
//!   tests and ephemeral deployments.
//! - [`FileStore`] keeps one JSON array file per collection in a directory
//!   and rewrites it atomically after every mutation.
//!
//! Both share the same collection semantics through an internal table type,
//! so they behave identically apart from durability.

mod file;
mod memory;
mod table;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Generate a fresh opaque document identifier
pub(crate) fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
