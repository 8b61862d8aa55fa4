use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::avro::{meta_value_field, AvroKind};
use crate::common::{avro_name, map_schema_tree};
use crate::error::{ConversionError, Result};
use crate::forward::conversion::Position;
use crate::forward::state::ForwardContext;

/// Field-level attributes pulled back out of a nested complex type.
const HOISTED: [&str; 3] = ["doc", "default", "order"];

/// Move a complex field's body under `type`.
///
/// `{name, type: "record", fields, doc}` becomes
/// `{name, type: {name, type: "record", fields}, doc}`. Arrays and maps
/// lose the name inside the body; named types keep it.
pub fn nest_complex_type(mut node: Map<String, Value>) -> Map<String, Value> {
    let name = node.remove("name");
    let hoisted: Vec<(String, Value)> = HOISTED
        .iter()
        .filter_map(|key| node.remove(*key).map(|value| (key.to_string(), value)))
        .collect();
    let named = node
        .get("type")
        .and_then(Value::as_str)
        .and_then(AvroKind::parse)
        .is_some_and(AvroKind::is_named);

    let mut body = Map::new();
    if named {
        if let Some(name) = &name {
            body.insert("name".to_string(), name.clone());
        }
    }
    body.extend(node);

    let mut field = Map::new();
    if let Some(name) = name {
        field.insert("name".to_string(), name);
    }
    field.insert("type".to_string(), Value::Object(body));
    field.extend(hoisted);
    field
}

/// Give an anonymous complex type a name: its `arrayItemName`, else the
/// enclosing node's name, else a generated placeholder.
pub fn assign_name(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    position: &Position<'_>,
    node: &mut Map<String, Value>,
) {
    let explicit = schema
        .get("arrayItemName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());
    let inherited = match position {
        Position::Item { parent } => *parent,
        Position::Root | Position::Field { .. } => None,
    };
    let name = match explicit.or(inherited) {
        Some(name) => name.to_string(),
        None => ctx.names.next_name(),
    };

    let mut named = Map::new();
    named.insert("name".to_string(), Value::String(name));
    named.extend(std::mem::take(node));
    *node = named;
}

/// Java-interop meta properties declared in a node's `metaProps` list.
///
/// Entries look like `{"metaKey": "avro.java.string", "metaValueString":
/// "String"}`; the plain `{"key", "value"}` form is accepted as well.
pub fn read_meta_properties(schema: &Map<String, Value>) -> Vec<(String, Value)> {
    let Some(entries) = schema.get("metaProps").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let key = entry
                .get("metaKey")
                .or_else(|| entry.get("key"))
                .and_then(Value::as_str)
                .filter(|key| !key.is_empty())?;
            let value = meta_value_field(key)
                .and_then(|field| entry.get(field))
                .or_else(|| entry.get("metaValue"))
                .or_else(|| entry.get("value"))?;
            Some((key.to_string(), value.clone()))
        })
        .collect()
}

/// Attach meta properties to the node's resolved type.
///
/// Complex bodies take them directly; primitive types are promoted to a
/// type object; union members are annotated one by one, except `null`.
pub fn attach_meta_properties(
    schema: &Map<String, Value>,
    kind: Option<AvroKind>,
    node: &mut Map<String, Value>,
) {
    let properties = read_meta_properties(schema);
    if properties.is_empty() {
        return;
    }
    if kind.is_some_and(AvroKind::is_complex) {
        node.extend(properties);
        return;
    }
    if let Some(avro_type) = node.get_mut("type") {
        let annotated = annotate(avro_type.take(), &properties);
        *avro_type = annotated;
    }
}

fn annotate(avro_type: Value, properties: &[(String, Value)]) -> Value {
    match avro_type {
        Value::String(token) if token == "null" => Value::String(token),
        Value::String(token) => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), Value::String(token));
            obj.extend(properties.iter().cloned());
            Value::Object(obj)
        }
        Value::Object(mut obj) => {
            obj.extend(properties.iter().cloned());
            Value::Object(obj)
        }
        Value::Array(members) => Value::Array(
            members
                .into_iter()
                .map(|member| annotate(member, properties))
                .collect(),
        ),
        other => other,
    }
}

/// Sanitize every `name` in an Avro tree, nested type bodies included.
pub fn sanitize_avro_names(tree: Value) -> Value {
    map_schema_tree(tree, &|mut node| {
        if let Some(Value::String(name)) = node.get_mut("name") {
            *name = avro_name(name);
        }
        node
    })
}

/// Fail when two fields of one record end up with the same name, which
/// happens when distinct property names sanitize to the same Avro name.
pub fn ensure_unique_field_names(tree: &Value) -> Result<()> {
    match tree {
        Value::Object(node) => {
            if let Some(Value::Array(fields)) = node.get("fields") {
                let mut seen = HashSet::new();
                for name in fields.iter().filter_map(|field| field.get("name")?.as_str()) {
                    if !seen.insert(name) {
                        let record = node.get("name").and_then(Value::as_str).unwrap_or("<anonymous>");
                        return Err(ConversionError::Structural(format!(
                            "record {record} has more than one field named {name}"
                        )));
                    }
                }
            }
            node.values().try_for_each(ensure_unique_field_names)
        }
        Value::Array(members) => members.iter().try_for_each(ensure_unique_field_names),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn nests_record_body_and_hoists_field_attributes() {
        let node = obj(json!({
            "name": "address", "type": "record", "fields": [], "doc": "home", "default": {}
        }));
        assert_eq!(
            Value::Object(nest_complex_type(node)),
            json!({
                "name": "address",
                "type": {"name": "address", "type": "record", "fields": []},
                "doc": "home",
                "default": {}
            })
        );
    }

    #[test]
    fn array_body_drops_name() {
        let node = obj(json!({"name": "tags", "type": "array", "items": "string"}));
        assert_eq!(
            Value::Object(nest_complex_type(node)),
            json!({"name": "tags", "type": {"type": "array", "items": "string"}})
        );
    }

    #[test]
    fn meta_properties_skip_null_members() {
        let schema = obj(json!({
            "metaProps": [
                {"metaKey": "avro.java.string", "metaValueString": "String"},
                {"metaKey": "java-class"}
            ]
        }));
        let mut node = obj(json!({"name": "s", "type": ["null", "string"]}));
        attach_meta_properties(&schema, None, &mut node);
        assert_eq!(
            node["type"],
            json!(["null", {"type": "string", "avro.java.string": "String"}])
        );
    }

    #[test]
    fn sanitizes_nested_names() {
        let tree = json!({
            "name": "my record",
            "type": "record",
            "fields": [{"name": "1st", "type": {"type": "enum", "name": "a-b", "symbols": []}}]
        });
        let clean = sanitize_avro_names(tree);
        assert_eq!(clean["name"], "my_record");
        assert_eq!(clean["fields"][0]["name"], "_st");
        assert_eq!(clean["fields"][0]["type"]["name"], "a_b");
    }

    #[test]
    fn duplicate_field_names_are_structural() {
        let tree = json!({
            "name": "Outer",
            "type": "record",
            "fields": [{"name": "inner", "type": {
                "name": "Inner", "type": "record",
                "fields": [{"name": "a_b", "type": "string"}, {"name": "a_b", "type": "int"}]
            }}]
        });
        let err = ensure_unique_field_names(&tree).unwrap_err();
        assert!(err.to_string().contains("record Inner has more than one field named a_b"));
        assert!(ensure_unique_field_names(&sanitize_avro_names(json!({
            "name": "Ok", "type": "record", "fields": [{"name": "a b", "type": "string"}]
        })))
        .is_ok());
    }
}
