//! Conversion between lists of named objects and maps keyed by name

use serde_json::{Map, Value};

/// Field carrying an entry's name in the list shape
pub const NAME_FIELD: &str = "name";

/// Turn `[{"name": k, ..rest}]` into `{k: rest}`.
///
/// Entries that are not objects or have no string name cannot be keyed and
/// are dropped. Later duplicates overwrite earlier ones.
pub fn list_to_map<F>(list: &[Value], mut entry: F) -> Map<String, Value>
where
    F: FnMut(Map<String, Value>) -> Map<String, Value>,
{
    let mut out = Map::new();
    for item in list {
        let Some(obj) = item.as_object() else {
            continue;
        };
        let Some(name) = obj.get(NAME_FIELD).and_then(Value::as_str) else {
            continue;
        };
        let name = name.to_string();
        let mut rest = obj.clone();
        rest.remove(NAME_FIELD);
        out.insert(name, Value::Object(entry(rest)));
    }
    out
}

/// Turn `{k: rest}` into `[{"name": k, ..rest}]`.
///
/// Non-object values become a bare `{"name": k}` entry.
pub fn map_to_list<F>(map: &Map<String, Value>, mut entry: F) -> Vec<Value>
where
    F: FnMut(Map<String, Value>) -> Map<String, Value>,
{
    map.iter()
        .map(|(name, value)| {
            let body = value.as_object().cloned().unwrap_or_default();
            let mut obj = entry(body);
            obj.insert(NAME_FIELD.to_string(), Value::String(name.clone()));
            Value::Object(obj)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_to_map_drops_unnamed() {
        let list = vec![
            json!({"name": "a", "x": 1}),
            json!({"x": 2}),
            json!("junk"),
            json!({"name": 3}),
        ];
        let map = list_to_map(&list, |m| m);
        assert_eq!(Value::Object(map), json!({"a": {"x": 1}}));
    }

    #[test]
    fn test_map_to_list_non_object_entry() {
        let map = json!({"a": {"x": 1}, "b": 7});
        let list = map_to_list(map.as_object().unwrap(), |m| m);
        assert_eq!(list, vec![json!({"name": "a", "x": 1}), json!({"name": "b"})]);
    }
}
