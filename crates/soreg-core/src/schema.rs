//! Structural schema validation
//!
//! Candidate documents arrive as `serde_json::Value` in the internal shape.
//! Validation runs in two passes:
//!
//! 1. A type pass walks the raw document against the model's field table.
//!    Every field of the wrong JSON type is reported under its own path and
//!    removed, and `null` is treated as absent.
//! 2. The remaining document is decoded into the typed model and every
//!    `validator` constraint is checked.
//!
//! Both passes contribute to one failure listing every violation. Constraint
//! violations under a field already reported as mistyped are left out.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{FieldViolation, ValidationFailure};
use crate::models::{Gateway, SensorData, ServiceObject};

/// Field path used for violations that concern the whole document
pub const ROOT_FIELD: &str = "$";

/// Expected JSON type of a document field
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    String,
    Integer,
    Object(&'static [(&'static str, FieldType)]),
    List(&'static FieldType),
}

impl FieldType {
    fn expected(&self) -> &'static str {
        match self {
            FieldType::String => "must be a string",
            FieldType::Integer => "must be an integer",
            FieldType::Object(_) => "must be an object",
            FieldType::List(_) => "must be an array",
        }
    }
}

/// A model with a wire-named field table
pub trait Shape {
    const FIELDS: &'static [(&'static str, FieldType)];
}

const CHANNEL: FieldType = FieldType::Object(&[
    ("name", FieldType::String),
    ("description", FieldType::String),
    ("type", FieldType::String),
    ("unit", FieldType::String),
]);

const STREAM: FieldType = FieldType::Object(&[
    ("name", FieldType::String),
    ("description", FieldType::String),
    ("channels", FieldType::List(&CHANNEL)),
]);

const READING: FieldType = FieldType::Object(&[
    ("name", FieldType::String),
    ("value", FieldType::String),
]);

impl Shape for Gateway {
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::String),
        ("owner", FieldType::String),
        ("name", FieldType::String),
        ("URL", FieldType::String),
        ("port", FieldType::Integer),
        ("protocol", FieldType::String),
    ];
}

impl Shape for ServiceObject {
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::String),
        ("owner", FieldType::String),
        ("gatewayID", FieldType::String),
        ("name", FieldType::String),
        ("description", FieldType::String),
        ("streams", FieldType::List(&STREAM)),
        ("api_token", FieldType::String),
    ];
}

impl Shape for SensorData {
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("id", FieldType::String),
        ("owner", FieldType::String),
        ("soID", FieldType::String),
        ("stream", FieldType::String),
        ("lastUpdate", FieldType::Integer),
        ("channels", FieldType::List(&READING)),
    ];
}

/// Decode and validate a candidate document
pub fn validate<T>(candidate: &Value) -> Result<T, ValidationFailure>
where
    T: DeserializeOwned + Validate + Shape,
{
    let Value::Object(fields) = candidate else {
        return Err(ValidationFailure::single(
            ROOT_FIELD,
            "type",
            "document must be a JSON object",
        ));
    };

    let mut doc = fields.clone();
    let mut violations = Vec::new();
    check_fields(&mut doc, T::FIELDS, "", &mut violations);

    let result = match serde_json::from_value::<T>(Value::Object(doc)) {
        Ok(entity) => match entity.validate() {
            Ok(()) => Ok(entity),
            Err(errors) => {
                let mistyped: Vec<String> = violations.iter().map(|v| v.field.clone()).collect();
                violations.extend(
                    failure_from(&errors)
                        .violations
                        .into_iter()
                        .filter(|v| !mistyped.iter().any(|m| covers(m, &v.field))),
                );
                Err(())
            }
        },
        Err(e) => {
            violations.push(FieldViolation::new(ROOT_FIELD, "type", e.to_string()));
            Err(())
        }
    };

    match result {
        Ok(entity) if violations.is_empty() => Ok(entity),
        _ => {
            sort(&mut violations);
            tracing::debug!(violations = violations.len(), "Schema validation failed");
            Err(ValidationFailure::new(violations))
        }
    }
}

pub fn validate_gateway(candidate: &Value) -> Result<Gateway, ValidationFailure> {
    validate(candidate)
}

pub fn validate_service_object(candidate: &Value) -> Result<ServiceObject, ValidationFailure> {
    validate(candidate)
}

pub fn validate_sensor_data(candidate: &Value) -> Result<SensorData, ValidationFailure> {
    validate(candidate)
}

/// Report and remove every field whose JSON type does not match the table
fn check_fields(
    doc: &mut Map<String, Value>,
    table: &[(&str, FieldType)],
    prefix: &str,
    out: &mut Vec<FieldViolation>,
) {
    for (name, expected) in table {
        let path = join(prefix, name);
        let keep = match doc.get_mut(*name) {
            None => continue,
            Some(Value::Null) => false,
            Some(value) => check_value(value, *expected, &path, out),
        };
        if !keep {
            doc.remove(*name);
        }
    }
}

/// Returns false when the value has the wrong type and was reported
fn check_value(value: &mut Value, expected: FieldType, path: &str, out: &mut Vec<FieldViolation>) -> bool {
    let matches = match (expected, &mut *value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Integer, Value::Number(n)) => n.as_i64().is_some(),
        (FieldType::Object(table), Value::Object(fields)) => {
            check_fields(fields, table, path, out);
            true
        }
        (FieldType::List(item), Value::Array(items)) => {
            for (index, entry) in items.iter_mut().enumerate() {
                let entry_path = format!("{}[{}]", path, index);
                // Index positions must survive, so a bad entry becomes `{}`
                if !check_value(entry, *item, &entry_path, out) {
                    *entry = Value::Object(Map::new());
                }
            }
            true
        }
        _ => false,
    };
    if !matches {
        out.push(FieldViolation::new(path, "type", expected.expected()));
    }
    matches
}

/// True when `field` is `parent` or lies beneath it
fn covers(parent: &str, field: &str) -> bool {
    field
        .strip_prefix(parent)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

fn sort(violations: &mut [FieldViolation]) {
    violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.code.cmp(&b.code)));
}

/// Flatten nested validator errors into dotted/indexed field paths
pub fn failure_from(errors: &ValidationErrors) -> ValidationFailure {
    let mut violations = Vec::new();
    collect(errors, "", &mut violations);
    sort(&mut violations);
    ValidationFailure::new(violations)
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = if field == "__all__" {
            if prefix.is_empty() {
                ROOT_FIELD.to_string()
            } else {
                prefix.to_string()
            }
        } else {
            join(prefix, &wire_name(&field))
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    out.push(FieldViolation::new(
                        path.clone(),
                        err.code.to_string(),
                        describe(err),
                    ));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Map Rust field names back to the names used on the wire
fn wire_name(field: &str) -> String {
    match field {
        "url" => "URL".to_string(),
        "so_id" => "soID".to_string(),
        "gateway_id" => "gatewayID".to_string(),
        "last_update" => "lastUpdate".to_string(),
        "channel_type" => "type".to_string(),
        other => other.to_string(),
    }
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let param = |name: &str| err.params.get(name).map(|v| v.to_string());
    match err.code.as_ref() {
        "length" => match param("min") {
            Some(min) if min == "1" => "must not be empty".to_string(),
            Some(min) => format!("must have a length of at least {}", min),
            None => "has an invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            _ => "is out of range".to_string(),
        },
        "required" => "is required".to_string(),
        code => format!("violates constraint '{}'", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(failure: &ValidationFailure) -> Vec<&str> {
        failure.violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_service_object() {
        let so = validate_service_object(&json!({
            "owner": "u1",
            "streams": [{
                "name": "s1",
                "channels": [{"name": "c1", "type": "Number", "unit": "C"}]
            }]
        }))
        .unwrap();
        assert_eq!(so.streams[0].channels[0].channel_type.as_str(), "number");
    }

    #[test]
    fn test_empty_streams_rejected() {
        let failure = validate_service_object(&json!({"owner": "u1", "streams": []})).unwrap_err();
        assert_eq!(fields(&failure), vec!["streams"]);
        assert_eq!(failure.violations[0].message, "must not be empty");
    }

    #[test]
    fn test_collects_every_violation() {
        let failure = validate_service_object(&json!({
            "streams": [
                {"name": "s1", "channels": []},
                {"name": "s2", "channels": [{"name": "", "type": "float"}]}
            ]
        }))
        .unwrap_err();

        assert_eq!(
            fields(&failure),
            vec![
                "owner",
                "streams[0].channels",
                "streams[1].channels[0].name",
                "streams[1].channels[0].type",
                "streams[1].channels[0].unit",
            ]
        );
    }

    #[test]
    fn test_duplicate_stream_names_rejected() {
        let failure = validate_service_object(&json!({
            "owner": "u1",
            "streams": [
                {"name": "s1", "channels": [{"name": "c1", "type": "number", "unit": "C"}]},
                {"name": "s1", "channels": [{"name": "c1", "type": "number", "unit": "C"}]}
            ]
        }))
        .unwrap_err();
        assert_eq!(failure.violations[0].field, ROOT_FIELD);
        assert_eq!(failure.violations[0].code, "unique");
    }

    #[test]
    fn test_gateway_port_range() {
        let failure = validate_gateway(&json!({
            "owner": "u1",
            "name": "GW1",
            "URL": "http://x",
            "port": 70000
        }))
        .unwrap_err();
        assert_eq!(fields(&failure), vec!["port"]);
        assert_eq!(failure.violations[0].code, "range");

        assert!(validate_gateway(&json!({
            "owner": "u1",
            "name": "GW1",
            "URL": "http://x",
            "port": 65535
        }))
        .is_ok());
    }

    #[test]
    fn test_gateway_missing_fields_use_wire_names() {
        let failure = validate_gateway(&json!({"owner": "u1"})).unwrap_err();
        assert_eq!(fields(&failure), vec!["URL", "name"]);
    }

    #[test]
    fn test_sensor_data_requires_timestamp_and_values() {
        let failure = validate_sensor_data(&json!({
            "owner": "u1",
            "soID": "so1",
            "stream": "s1",
            "channels": [{"name": "c1"}]
        }))
        .unwrap_err();
        assert_eq!(fields(&failure), vec!["channels[0].value", "lastUpdate"]);
    }

    #[test]
    fn test_non_object_is_root_violation() {
        let failure = validate_gateway(&json!([1, 2])).unwrap_err();
        assert_eq!(fields(&failure), vec![ROOT_FIELD]);
        assert_eq!(failure.violations[0].code, "type");
    }

    #[test]
    fn test_mistyped_field_reported_alongside_others() {
        let failure = validate_gateway(&json!({"owner": "u1", "port": "abc"})).unwrap_err();
        assert_eq!(fields(&failure), vec!["URL", "name", "port"]);
        assert_eq!(failure.violations[2].code, "type");
        assert_eq!(failure.violations[2].message, "must be an integer");
    }

    #[test]
    fn test_mistyped_field_replaces_its_constraint_violations() {
        let failure = validate_sensor_data(&json!({
            "owner": "u1",
            "soID": "so1",
            "stream": "s1",
            "lastUpdate": "1000",
            "channels": []
        }))
        .unwrap_err();
        assert_eq!(
            failure
                .violations
                .iter()
                .map(|v| (v.field.as_str(), v.code.as_str()))
                .collect::<Vec<_>>(),
            vec![("channels", "length"), ("lastUpdate", "type")]
        );
    }

    #[test]
    fn test_nested_mistyped_field_keeps_indexes() {
        let failure = validate_service_object(&json!({
            "owner": "u1",
            "streams": [
                {"name": "s1", "channels": [{"name": "c1", "description": 5, "type": "number", "unit": "C"}]},
                {"name": "", "channels": []},
                "s3"
            ]
        }))
        .unwrap_err();
        assert_eq!(
            fields(&failure),
            vec![
                "streams[0].channels[0].description",
                "streams[1].channels",
                "streams[1].name",
                "streams[2]",
            ]
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let gateway = validate_gateway(&json!({
            "owner": "u1",
            "name": "GW1",
            "URL": "http://x",
            "port": null
        }))
        .unwrap();
        assert_eq!(gateway.port, None);

        let failure = validate_gateway(&json!({"owner": "u1", "name": null, "URL": "http://x"}))
            .unwrap_err();
        assert_eq!(fields(&failure), vec!["name"]);
        assert_eq!(failure.violations[0].code, "length");
    }

    #[test]
    fn test_wrong_container_type() {
        let failure = validate_service_object(&json!({"owner": "u1", "streams": "s1"})).unwrap_err();
        assert_eq!(fields(&failure), vec!["streams"]);
        assert_eq!(failure.violations[0].message, "must be an array");
    }
}
