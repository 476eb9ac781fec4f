//! Gateway models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A network endpoint hosting zero or more Service Objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Gateway {
    /// Store-generated identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owner identifier (caller identity at creation)
    #[serde(default)]
    #[validate(length(min = 1))]
    pub owner: String,
    /// Human-readable name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    /// Endpoint URL
    #[serde(rename = "URL", default)]
    #[validate(length(min = 1))]
    pub url: String,
    /// TCP port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i64>,
    /// Protocol spoken by the gateway (e.g. "mqtt", "http")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl Gateway {
    /// Create a gateway record from a name/URL pair
    pub fn new(owner: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            owner: owner.into(),
            name: name.into(),
            url: url.into(),
            port: None,
            protocol: None,
        }
    }
}

/// Transient gateway reference embedded in a Service Object write payload.
///
/// Never persisted: the resolver turns it into a `gatewayID` on the
/// Service Object and the descriptor itself is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GatewayDescriptor {
    #[serde(rename = "gatewayID", default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

impl GatewayDescriptor {
    /// Descriptor that points at a known gateway
    pub fn by_id(gateway_id: impl Into<String>) -> Self {
        Self {
            gateway_id: Some(gateway_id.into()),
            ..Self::default()
        }
    }

    /// Descriptor that names a gateway by its (name, URL) pair
    pub fn by_endpoint(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            gateway_id: None,
            name: Some(name.into()),
            url: Some(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_wire_names() {
        let mut gw = Gateway::new("u1", "GW1", "http://x");
        gw.port = Some(1883);
        let value = serde_json::to_value(&gw).unwrap();
        assert_eq!(
            value,
            json!({"owner": "u1", "name": "GW1", "URL": "http://x", "port": 1883})
        );
    }

    #[test]
    fn test_descriptor_deserialize() {
        let d: GatewayDescriptor =
            serde_json::from_value(json!({"gatewayID": "g1", "name": "GW1"})).unwrap();
        assert_eq!(d.gateway_id.as_deref(), Some("g1"));
        assert_eq!(d.name.as_deref(), Some("GW1"));
        assert!(d.url.is_none());
    }
}
