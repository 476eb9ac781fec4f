//! soreg-conv - Wire shape conversion for Service Objects and Sensor Data
//!
//! Two JSON conventions describe the same entities:
//!
//! | Shape | `streams` / `channels` | Used |
//! |-------|------------------------|------|
//! | Servioticy (external) | map keyed by name, name field omitted | API boundary |
//! | Serios (internal) | ordered list of objects carrying `name` | storage |
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use soreg_conv::service_object;
//!
//! let external = json!({
//!     "streams": {
//!         "temperature": {
//!             "channels": {"celsius": {"type": "number", "unit": "C"}}
//!         }
//!     }
//! });
//!
//! let internal = service_object::to_internal(&external);
//! assert_eq!(internal["streams"][0]["name"], json!("temperature"));
//! assert_eq!(internal["streams"][0]["channels"][0]["name"], json!("celsius"));
//!
//! assert_eq!(service_object::to_external(&internal), external);
//! ```
//!
//! Conversion is total: malformed nested entries are passed through or
//! dropped, never rejected. Structural validation is a separate step.
//! List order is not preserved through a round trip.

mod keyed;
pub mod sensor_data;
pub mod service_object;

pub use keyed::{list_to_map, map_to_list, NAME_FIELD};
