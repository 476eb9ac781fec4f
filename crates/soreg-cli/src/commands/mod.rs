//! Command implementations for soreg

pub mod gateway;
pub mod sensor_data;
pub mod service_object;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

pub use gateway::GatewayCommand;
pub use sensor_data::DataCommand;
pub use service_object::ServiceObjectCommand;

/// Read a JSON payload from a file, or from stdin when the path is `-`
pub fn read_payload(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file '{}'", path.display()))?
    };
    serde_json::from_str(&content).context("Payload is not valid JSON")
}
