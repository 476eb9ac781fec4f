//! Sensor Data models (internal, array-based shape)

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One timestamped set of channel readings pushed to a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SensorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub owner: String,
    #[serde(rename = "soID", default)]
    #[validate(length(min = 1))]
    pub so_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub stream: String,
    /// Client-supplied timestamp
    #[serde(rename = "lastUpdate", default)]
    #[validate(required)]
    pub last_update: Option<i64>,
    #[serde(default)]
    #[validate(length(min = 1), nested)]
    pub channels: Vec<ChannelReading>,
}

/// A single channel value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ChannelReading {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(required)]
    pub value: Option<String>,
}

impl ChannelReading {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Query modifier for sensor data reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataModifier {
    /// Every matching record
    #[default]
    All,
    /// Only the most recent record per stream, by `lastUpdate`
    LastUpdate,
}

impl DataModifier {
    /// Parse a modifier string; unrecognized values mean `All`
    pub fn parse(s: &str) -> Self {
        match s {
            "lastUpdate" => DataModifier::LastUpdate,
            _ => DataModifier::All,
        }
    }

    /// Resolve an optional caller-supplied modifier against a default
    pub fn from_option(s: Option<&str>, default: DataModifier) -> Self {
        s.map(Self::parse).unwrap_or(default)
    }
}
