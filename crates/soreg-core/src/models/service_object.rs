//! Service Object models (internal, array-based shape)

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A registered virtual sensor exposing one or more streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "unique_stream_names", skip_on_field_errors = false))]
pub struct ServiceObject {
    /// Store-generated identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owner identifier
    #[serde(default)]
    #[validate(length(min = 1))]
    pub owner: String,
    /// Resolved gateway reference
    #[serde(rename = "gatewayID", default, skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered, non-empty stream list
    #[serde(default)]
    #[validate(length(min = 1), nested)]
    pub streams: Vec<Stream>,
    /// Server-generated API access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl ServiceObject {
    /// Find a stream by name
    pub fn stream(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.stream(name).is_some()
    }
}

/// A named group of channels representing one physical sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Stream {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1), nested)]
    pub channels: Vec<Channel>,
}

/// A single typed measurement within a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Channel {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    #[validate(custom(function = "known_channel_type"))]
    pub channel_type: ChannelType,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub unit: String,
}

/// Channel value type. Parsing is case-insensitive; unknown names are kept
/// as `Unknown` so that schema validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelType {
    Number,
    String,
    Boolean,
    GeoLocation,
    Unknown(String),
}

impl ChannelType {
    /// Accepted type names
    pub const NAMES: [&'static str; 4] = ["number", "string", "boolean", "geo_location"];

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "number" => ChannelType::Number,
            "string" => ChannelType::String,
            "boolean" => ChannelType::Boolean,
            "geo_location" => ChannelType::GeoLocation,
            _ => ChannelType::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChannelType::Number => "number",
            ChannelType::String => "string",
            ChannelType::Boolean => "boolean",
            ChannelType::GeoLocation => "geo_location",
            ChannelType::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ChannelType::Unknown(_))
    }
}

impl Default for ChannelType {
    fn default() -> Self {
        ChannelType::Unknown(String::new())
    }
}

impl From<String> for ChannelType {
    fn from(s: String) -> Self {
        ChannelType::parse(&s)
    }
}

impl From<ChannelType> for String {
    fn from(t: ChannelType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn known_channel_type(channel_type: &ChannelType) -> Result<(), ValidationError> {
    if channel_type.is_known() {
        return Ok(());
    }
    let mut err = ValidationError::new("enum");
    err.message = Some(Cow::from(format!(
        "'{}' is not one of {}",
        channel_type,
        ChannelType::NAMES.join(", ")
    )));
    Err(err)
}

fn unique_stream_names(so: &ServiceObject) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for stream in &so.streams {
        if !stream.name.is_empty() && !seen.insert(stream.name.as_str()) {
            let mut err = ValidationError::new("unique");
            err.message = Some(Cow::from(format!(
                "duplicate stream name '{}'",
                stream.name
            )));
            return Err(err);
        }
    }
    Ok(())
}

/// Result of creating a Service Object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceObjectCreated {
    #[serde(rename = "soID")]
    pub so_id: String,
    #[serde(rename = "gatewayID", skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    pub api_token: String,
}

/// Result of updating a Service Object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceObjectUpdated {
    #[serde(rename = "soID")]
    pub so_id: String,
    #[serde(rename = "gatewayID", skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
}
