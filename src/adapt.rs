//! Adaptation passes over generic schemas.
//!
//! Each pass is a node transform run through [`map_schema_tree`], so it
//! sees every nested property, item and definition.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

use crate::common::{avro_name, map_schema_tree, ref_target, retarget_ref};

/// Which optional passes run ahead of forward conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptOptions {
    pub null_defaults: bool,
}

/// Run the passes forward conversion expects on a parsed generic schema.
pub fn prepare_generic_schema(schema: Value, options: AdaptOptions) -> Value {
    let schema = adapt_formats(schema);
    let schema = if options.null_defaults {
        add_null_defaults(schema)
    } else {
        schema
    };
    sanitize_names(schema)
}

/// Turn JSON-Schema string formats into Avro logical types.
pub fn adapt_formats(schema: Value) -> Value {
    map_schema_tree(schema, &|node| {
        let Value::Object(mut obj) = node else {
            return node;
        };
        let token = obj.get("type").and_then(Value::as_str);
        let format = obj.get("format").and_then(Value::as_str);
        let adapted = match (token, format) {
            (Some("string"), Some("date")) => Some(("number", Some("int"), "date")),
            (Some("string"), Some("time")) => Some(("number", Some("int"), "time-millis")),
            (Some("string"), Some("date-time")) => {
                Some(("number", Some("long"), "timestamp-millis"))
            }
            (Some("number"), Some("decimal")) => Some(("bytes", None, "decimal")),
            _ => None,
        };
        if let Some((token, mode, logical_type)) = adapted {
            obj.insert("type".to_string(), Value::String(token.to_string()));
            match mode {
                Some(mode) => obj.insert("mode".to_string(), Value::String(mode.to_string())),
                None => obj.remove("mode"),
            };
            obj.insert(
                "logicalType".to_string(),
                Value::String(logical_type.to_string()),
            );
        }
        Value::Object(obj)
    })
}

/// Give every optional multi-type property a leading `null` member and,
/// when it has none, a `null` default.
pub fn add_null_defaults(schema: Value) -> Value {
    map_schema_tree(schema, &|node| {
        let Value::Object(mut obj) = node else {
            return node;
        };
        let required: Vec<String> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(Value::Object(properties)) = obj.get_mut("properties") {
            for (name, property) in properties.iter_mut() {
                if required.contains(name) {
                    continue;
                }
                if let Value::Object(property) = property {
                    make_nullable(property);
                }
            }
        }
        Value::Object(obj)
    })
}

fn make_nullable(property: &mut Map<String, Value>) {
    let Some(Value::Array(members)) = property.get_mut("type") else {
        return;
    };
    if members.len() < 2 {
        return;
    }
    match members.iter().position(|member| member == "null") {
        Some(0) => {}
        Some(index) => {
            let null = members.remove(index);
            members.insert(0, null);
        }
        None => members.insert(0, Value::String("null".to_string())),
    }
    property
        .entry("default")
        .or_insert(Value::Null);
}

/// Make every property, definition and reference name a valid Avro name.
pub fn sanitize_names(schema: Value) -> Value {
    map_schema_tree(schema, &|node| {
        let Value::Object(mut obj) = node else {
            return node;
        };
        for key in ["properties", "definitions", "patternProperties"] {
            if let Some(Value::Object(children)) = obj.get_mut(key) {
                *children = sanitize_keys(std::mem::take(children), key);
            }
        }
        if let Some(Value::Array(required)) = obj.get_mut("required") {
            for entry in required.iter_mut() {
                if let Value::String(name) = entry {
                    *name = avro_name(name);
                }
            }
        }
        if let Some(Value::String(reference)) = obj.get_mut("$ref") {
            if let Some(target) = ref_target(reference) {
                let renamed = retarget_ref(reference, &avro_name(target));
                *reference = renamed;
            }
        }
        Value::Object(obj)
    })
}

/// Rename every key to its Avro form. A key whose Avro form is already
/// taken keeps its original spelling, so nothing is overwritten.
fn sanitize_keys(children: Map<String, Value>, section: &str) -> Map<String, Value> {
    let valid: HashSet<String> = children
        .keys()
        .filter(|name| avro_name(name) == **name)
        .cloned()
        .collect();
    let mut out = Map::with_capacity(children.len());
    for (name, child) in children {
        let clean = avro_name(&name);
        if clean != name && (valid.contains(&clean) || out.contains_key(&clean)) {
            warn!(section, name = %name, sanitized = %clean, "sanitized name collides with a sibling");
            out.insert(name, child);
        } else {
            out.insert(clean, child);
        }
    }
    out
}
