//! Sensor Data update conversion
//!
//! Internal: `channels: [{name, value}]`
//! External: `channels: {name: {"current-value": value}}`
//!
//! All other fields (`lastUpdate`, `soID`, ...) are carried as siblings
//! unchanged. Internal values are strings; scalar external values are
//! stringified on the way in.

use serde_json::{Map, Value};

use crate::keyed::{list_to_map, map_to_list};

/// Key holding a channel's value in the external shape
pub const CURRENT_VALUE: &str = "current-value";

const CHANNELS: &str = "channels";
const VALUE: &str = "value";

/// Convert an internal sensor data record into the external shape
pub fn to_external(internal: &Value) -> Value {
    let Some(obj) = internal.as_object() else {
        return internal.clone();
    };
    let mut out = obj.clone();
    if let Some(Value::Array(channels)) = obj.get(CHANNELS) {
        let map = list_to_map(channels, reading_to_external);
        out.insert(CHANNELS.to_string(), Value::Object(map));
    }
    Value::Object(out)
}

/// Convert an external sensor data update into the internal shape
pub fn to_internal(external: &Value) -> Value {
    let Some(obj) = external.as_object() else {
        return external.clone();
    };
    let mut out = obj.clone();
    if let Some(Value::Object(channels)) = obj.get(CHANNELS) {
        let list = map_to_list(channels, reading_to_internal);
        out.insert(CHANNELS.to_string(), Value::Array(list));
    }
    Value::Object(out)
}

fn reading_to_external(mut reading: Map<String, Value>) -> Map<String, Value> {
    if let Some(value) = reading.remove(VALUE) {
        reading.insert(CURRENT_VALUE.to_string(), value);
    }
    reading
}

fn reading_to_internal(mut reading: Map<String, Value>) -> Map<String, Value> {
    if let Some(value) = reading.remove(CURRENT_VALUE).and_then(stringify) {
        reading.insert(VALUE.to_string(), Value::String(value));
    }
    reading
}

/// Render a reading value as the stored string; null means no value
fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
