//! Service Object description conversion
//!
//! Internal: `streams: [{name, channels: [{name, type, unit}]}]`
//! External: `streams: {name: {channels: {name: {type, unit}}}}`

use serde_json::{Map, Value};

use crate::keyed::{list_to_map, map_to_list};

const STREAMS: &str = "streams";
const CHANNELS: &str = "channels";

/// Convert an internal (list) Service Object into the external (map) shape
pub fn to_external(internal: &Value) -> Value {
    let Some(obj) = internal.as_object() else {
        return internal.clone();
    };
    let mut out = obj.clone();
    if let Some(Value::Array(streams)) = obj.get(STREAMS) {
        let map = list_to_map(streams, stream_to_external);
        out.insert(STREAMS.to_string(), Value::Object(map));
    }
    Value::Object(out)
}

/// Convert an external (map) Service Object into the internal (list) shape
pub fn to_internal(external: &Value) -> Value {
    let Some(obj) = external.as_object() else {
        return external.clone();
    };
    let mut out = obj.clone();
    if let Some(Value::Object(streams)) = obj.get(STREAMS) {
        let list = map_to_list(streams, stream_to_internal);
        out.insert(STREAMS.to_string(), Value::Array(list));
    }
    Value::Object(out)
}

fn stream_to_external(mut stream: Map<String, Value>) -> Map<String, Value> {
    match stream.remove(CHANNELS) {
        Some(Value::Array(channels)) => {
            let map = list_to_map(&channels, |c| c);
            stream.insert(CHANNELS.to_string(), Value::Object(map));
        }
        Some(Value::Object(map)) => {
            stream.insert(CHANNELS.to_string(), Value::Object(map));
        }
        _ => {}
    }
    stream
}

fn stream_to_internal(mut stream: Map<String, Value>) -> Map<String, Value> {
    match stream.remove(CHANNELS) {
        Some(Value::Object(channels)) => {
            let list = map_to_list(&channels, |c| c);
            stream.insert(CHANNELS.to_string(), Value::Array(list));
        }
        Some(Value::Array(list)) => {
            stream.insert(CHANNELS.to_string(), Value::Array(list));
        }
        _ => {}
    }
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Sort streams and channels by name so list order does not matter
    fn canonical(mut so: Value) -> Value {
        fn sort_by_name(list: &mut [Value]) {
            list.sort_by(|a, b| {
                let a = a["name"].as_str().unwrap_or_default();
                let b = b["name"].as_str().unwrap_or_default();
                a.cmp(b)
            });
        }
        if let Some(streams) = so["streams"].as_array_mut() {
            for stream in streams.iter_mut() {
                if let Some(channels) = stream["channels"].as_array_mut() {
                    sort_by_name(channels);
                }
            }
            sort_by_name(streams);
        }
        so
    }

    fn sample_internal() -> Value {
        json!({
            "id": "so1",
            "owner": "u1",
            "gatewayID": "g1",
            "api_token": "tok",
            "streams": [
                {
                    "name": "weather",
                    "description": "outdoor",
                    "channels": [
                        {"name": "temp", "type": "number", "unit": "C"},
                        {"name": "hum", "type": "number", "unit": "%"}
                    ]
                },
                {
                    "name": "location",
                    "channels": [{"name": "pos", "type": "geo_location", "unit": "deg"}]
                }
            ]
        })
    }

    #[test]
    fn test_to_external_keys_by_name() {
        let external = to_external(&sample_internal());
        assert_eq!(
            external["streams"]["weather"],
            json!({
                "description": "outdoor",
                "channels": {
                    "temp": {"type": "number", "unit": "C"},
                    "hum": {"type": "number", "unit": "%"}
                }
            })
        );
        assert_eq!(external["owner"], json!("u1"));
        assert_eq!(external["gatewayID"], json!("g1"));
    }

    #[test]
    fn test_round_trip_modulo_order() {
        let internal = sample_internal();
        let back = to_internal(&to_external(&internal));
        assert_eq!(canonical(back), canonical(internal));
    }

    #[test]
    fn test_stream_without_channels_passes_through() {
        let external = json!({"streams": {"s1": {"description": "no channels"}}});
        let internal = to_internal(&external);
        assert_eq!(
            internal["streams"],
            json!([{"name": "s1", "description": "no channels"}])
        );
    }

    #[test]
    fn test_malformed_channels_dropped() {
        let external = json!({"streams": {"s1": {"channels": "oops"}, "s2": 5}});
        let internal = to_internal(&external);
        assert_eq!(internal["streams"], json!([{"name": "s1"}, {"name": "s2"}]));
    }

    #[test]
    fn test_already_converted_shapes_unchanged() {
        let internal = sample_internal();
        assert_eq!(to_internal(&internal), internal);

        let external = to_external(&internal);
        assert_eq!(to_external(&external), external);
    }

    #[test]
    fn test_non_object_passes_through() {
        assert_eq!(to_internal(&json!("x")), json!("x"));
        assert_eq!(to_external(&json!(null)), json!(null));
        assert_eq!(to_internal(&json!({"owner": "u1"})), json!({"owner": "u1"}));
    }
}
