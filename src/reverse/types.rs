use serde_json::{Map, Value};
use tracing::debug;

use crate::avro::{is_meta_property, AvroKind, DEFAULT_TYPE};
use crate::common::split_qualified_name;
use crate::properties::PropertyTable;

/// Keys that carry structure rather than attributes.
const STRUCTURAL_KEYS: [&str; 5] = ["name", "type", "fields", "items", "values"];

/// Generic form of an Avro primitive: numeric kinds collapse to
/// `number` with a `mode`.
pub fn primitive_node(kind: AvroKind) -> Map<String, Value> {
    let mut node = Map::new();
    if kind.is_numeric() {
        node.insert("type".to_string(), Value::String("number".to_string()));
        node.insert("mode".to_string(), Value::String(kind.as_str().to_string()));
    } else {
        node.insert("type".to_string(), Value::String(kind.as_str().to_string()));
    }
    node
}

/// `$ref` to the definition a named type is hoisted into.
pub fn reference_node(name: &str) -> Map<String, Value> {
    let (_, local) = split_qualified_name(name);
    let mut node = Map::new();
    node.insert(
        "$ref".to_string(),
        Value::String(format!("#/definitions/{local}")),
    );
    node
}

/// Stand-in for a reference to an enclosing record.
pub fn placeholder_node() -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("type".to_string(), Value::String(DEFAULT_TYPE.to_string()));
    node
}

/// Textual `map<...>` subtype describing a map's values.
pub fn map_subtype(values: Option<&Value>) -> String {
    let inner = match values {
        Some(Value::String(token)) => split_qualified_name(token).1.to_string(),
        Some(Value::Object(body)) => match (body.get("name"), body.get("type")) {
            (Some(Value::String(name)), _) => split_qualified_name(name).1.to_string(),
            (_, Some(Value::String(token))) => token.clone(),
            _ => DEFAULT_TYPE.to_string(),
        },
        Some(Value::Array(members)) => members
            .iter()
            .filter_map(Value::as_str)
            .find(|member| *member != "null")
            .map_or_else(|| DEFAULT_TYPE.to_string(), |token| split_qualified_name(token).1.to_string()),
        _ => DEFAULT_TYPE.to_string(),
    };
    format!("map<{inner}>")
}

/// The kind a union member or type slot stands for, if it is a plain
/// Avro kind rather than a reference.
pub fn kind_of(avro_type: &Value) -> Option<AvroKind> {
    match avro_type {
        Value::String(token) => AvroKind::parse(token),
        Value::Object(body) => body.get("type").and_then(Value::as_str).and_then(AvroKind::parse),
        _ => None,
    }
}

/// Copy the attributes `kind` (or any field) may carry from `source`.
///
/// Meta properties and structural keys are handled elsewhere; anything
/// the property table does not know is dropped.
pub fn copy_attributes(
    table: &PropertyTable,
    kind: Option<AvroKind>,
    source: &Map<String, Value>,
    target: &mut Map<String, Value>,
) {
    for (key, value) in source {
        if STRUCTURAL_KEYS.contains(&key.as_str()) || is_meta_property(key) {
            continue;
        }
        let allowed = table.is_field_level(key)
            || kind.is_some_and(|kind| table.is_allowed(kind, key, source));
        if allowed {
            target.insert(key.clone(), value.clone());
        } else {
            debug!(key = key.as_str(), "dropping attribute not allowed here");
        }
    }
}
