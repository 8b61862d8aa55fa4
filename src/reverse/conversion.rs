use serde_json::{Map, Value};
use tracing::warn;

use crate::avro::AvroKind;
use crate::common::{split_qualified_name, DEFAULT_NAME};
use crate::error::{ConversionError, Result};
use crate::reverse::meta::collect_meta_properties;
use crate::reverse::state::ReverseContext;
use crate::reverse::types::{
    copy_attributes, map_subtype, placeholder_node, primitive_node, reference_node,
};
use crate::reverse::unions::convert_union;

/// Convert an Avro type (token, type object or union) into a generic node.
///
/// `field_name` is the enclosing field, used to name union alternatives.
pub fn convert_type(
    ctx: &mut ReverseContext<'_>,
    avro_type: &Value,
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    match avro_type {
        Value::String(token) => Ok(convert_token(ctx, token)),
        Value::Object(body) => convert_type_object(ctx, body, field_name),
        Value::Array(members) => convert_union(ctx, members, field_name),
        other => Err(ConversionError::Structural(format!(
            "unsupported Avro type {other}"
        ))),
    }
}

fn convert_token(ctx: &ReverseContext<'_>, token: &str) -> Map<String, Value> {
    match AvroKind::parse(token) {
        Some(kind) if kind.is_primitive() => primitive_node(kind),
        Some(AvroKind::Map) => {
            let mut node = Map::new();
            node.insert("type".to_string(), Value::String("map".to_string()));
            node.insert("subtype".to_string(), Value::String(map_subtype(None)));
            node.insert("keyType".to_string(), Value::String("string".to_string()));
            node
        }
        Some(kind) => {
            let mut node = Map::new();
            node.insert("type".to_string(), Value::String(kind.as_str().to_string()));
            node
        }
        None => named_reference(ctx, token),
    }
}

fn named_reference(ctx: &ReverseContext<'_>, name: &str) -> Map<String, Value> {
    let (_, local) = split_qualified_name(name);
    if ctx.is_enclosing_record(local) {
        warn!(name, "recursive reference replaced by a string placeholder");
        return placeholder_node();
    }
    reference_node(name)
}

fn convert_type_object(
    ctx: &mut ReverseContext<'_>,
    body: &Map<String, Value>,
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    let kind = match body.get("type") {
        Some(Value::String(token)) => AvroKind::parse(token),
        Some(nested) => {
            let mut node = convert_type(ctx, nested, field_name)?;
            copy_attributes(ctx.table, None, body, &mut node);
            return Ok(node);
        }
        None => {
            return Err(ConversionError::Structural(format!(
                "Avro type object without a type: {}",
                Value::Object(body.clone())
            )))
        }
    };

    match (kind, body.get("name").and_then(Value::as_str)) {
        (Some(kind), Some(name)) if kind.is_named() => {
            hoist_named_type(ctx, kind, name, body)?;
            Ok(named_reference(ctx, name))
        }
        (Some(kind), _) => convert_body(ctx, kind, body, field_name),
        (None, _) => {
            // `{"type": "com.acme.Address"}` is a reference with attributes.
            let token = body.get("type").and_then(Value::as_str).unwrap_or_default();
            let mut node = named_reference(ctx, token);
            copy_attributes(ctx.table, None, body, &mut node);
            Ok(node)
        }
    }
}

/// Convert a named type once and store it under its local name.
pub fn hoist_named_type(
    ctx: &mut ReverseContext<'_>,
    kind: AvroKind,
    name: &str,
    body: &Map<String, Value>,
) -> Result<()> {
    let (namespace, local) = split_qualified_name(name);
    if ctx.is_defined(local) || ctx.is_enclosing_record(local) {
        return Ok(());
    }

    let is_record = kind == AvroKind::Record;
    if is_record {
        ctx.enter_record(local);
    }
    let converted = convert_body(ctx, kind, body, None);
    if is_record {
        ctx.exit_record();
    }
    let mut definition = converted?;
    if let Some(namespace) = namespace {
        definition
            .entry("namespace")
            .or_insert_with(|| Value::String(namespace.to_string()));
    }
    ctx.define(local, definition);
    Ok(())
}

/// Convert the body of an Avro type object of a known kind.
pub fn convert_body(
    ctx: &mut ReverseContext<'_>,
    kind: AvroKind,
    body: &Map<String, Value>,
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    let mut node = Map::new();
    match kind {
        AvroKind::Record => {
            node.insert("type".to_string(), Value::String("record".to_string()));
            convert_fields(ctx, body, &mut node)?;
        }
        AvroKind::Array => {
            node.insert("type".to_string(), Value::String("array".to_string()));
            if let Some(items) = body.get("items") {
                let items = convert_items(ctx, items, field_name)?;
                node.insert("items".to_string(), items);
            }
        }
        AvroKind::Map => {
            let values = body.get("values");
            if let Some(Value::Object(values)) = values {
                hoist_nested(ctx, values)?;
            }
            node.insert("type".to_string(), Value::String("map".to_string()));
            node.insert("subtype".to_string(), Value::String(map_subtype(values)));
            node.insert("keyType".to_string(), Value::String("string".to_string()));
        }
        AvroKind::Enum | AvroKind::Fixed => {
            node.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        }
        AvroKind::Null
        | AvroKind::Boolean
        | AvroKind::Int
        | AvroKind::Long
        | AvroKind::Float
        | AvroKind::Double
        | AvroKind::Bytes
        | AvroKind::String => node.extend(primitive_node(kind)),
    }
    copy_attributes(ctx.table, Some(kind), body, &mut node);
    if let Some(meta) = collect_meta_properties(body) {
        node.insert("metaProps".to_string(), meta);
    }
    Ok(node)
}

/// Hoist a named type found where only its name is kept, e.g. map values.
fn hoist_nested(ctx: &mut ReverseContext<'_>, body: &Map<String, Value>) -> Result<()> {
    let kind = body.get("type").and_then(Value::as_str).and_then(AvroKind::parse);
    match (kind, body.get("name").and_then(Value::as_str)) {
        (Some(kind), Some(name)) if kind.is_named() => hoist_named_type(ctx, kind, name, body),
        _ => Ok(()),
    }
}

/// Items are a single type, or a positional list converted item by item.
fn convert_items(
    ctx: &mut ReverseContext<'_>,
    items: &Value,
    field_name: Option<&str>,
) -> Result<Value> {
    match items {
        Value::Array(list) => list
            .iter()
            .map(|item| convert_type(ctx, item, field_name).map(Value::Object))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        single => convert_type(ctx, single, field_name).map(Value::Object),
    }
}

/// `fields` become `properties`; a field without a `default` is required.
fn convert_fields(
    ctx: &mut ReverseContext<'_>,
    body: &Map<String, Value>,
    node: &mut Map<String, Value>,
) -> Result<()> {
    let fields = match body.get("fields") {
        Some(Value::Array(fields)) => fields.as_slice(),
        Some(other) => {
            return Err(ConversionError::Structural(format!(
                "record fields must be a list, got {other}"
            )))
        }
        None => &[],
    };

    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let Value::Object(field) = field else {
            return Err(ConversionError::Structural(format!(
                "record field must be an object, got {field}"
            )));
        };
        let name = field
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_NAME);
        let property = convert_field(ctx, name, field)?;
        if !field.contains_key("default") {
            required.push(Value::String(name.to_string()));
        }
        properties.insert(name.to_string(), Value::Object(property));
    }

    node.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        node.insert("required".to_string(), Value::Array(required));
    }
    Ok(())
}

fn convert_field(
    ctx: &mut ReverseContext<'_>,
    name: &str,
    field: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let avro_type = field.get("type").cloned().unwrap_or(Value::Null);
    let mut property = match &avro_type {
        Value::Null => primitive_node(AvroKind::String),
        other => convert_type(ctx, other, Some(name))?,
    };

    let kind = avro_type.as_str().and_then(AvroKind::parse);
    copy_attributes(ctx.table, kind, field, &mut property);
    if let Some(meta) = collect_meta_properties(field) {
        property.insert("metaProps".to_string(), meta);
    }

    let null_first = avro_type
        .as_array()
        .and_then(|members| members.first())
        .is_some_and(|first| first == "null");
    if null_first && !field.contains_key("default") {
        property.insert("default".to_string(), Value::Null);
    }
    Ok(property)
}
