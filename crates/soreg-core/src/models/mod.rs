//! Entity models persisted by the registry

mod gateway;
mod sensor_data;
mod service_object;

pub use gateway::*;
pub use sensor_data::*;
pub use service_object::*;
