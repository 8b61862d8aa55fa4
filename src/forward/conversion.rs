use serde_json::{Map, Value};
use tracing::debug;

use crate::avro::{AvroKind, DEFAULT_TYPE};
use crate::common::{coerce_default, default_kind};
use crate::error::{ConversionError, Result};
use crate::forward::choices::merge_choices;
use crate::forward::state::ForwardContext;
use crate::forward::structure::{assign_name, attach_meta_properties, nest_complex_type};
use crate::forward::types::{map_values, resolve_type, type_attributes, ResolvedType};

/// Where a node sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    /// The top-level record.
    Root,
    /// A record field; `required` comes from the parent's `required` list.
    Field { required: bool },
    /// Anything that is a bare type: array items, union members, nested
    /// type objects and user-defined type bodies. `parent` names the
    /// enclosing node for naming anonymous complex types.
    Item { parent: Option<&'a str> },
}

/// Convert one generic-schema node into its Avro form.
///
/// At `Field` position a complex type is nested under `type`; at every
/// other position the node comes back as a type body.
pub fn convert_node(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    name: Option<&str>,
    position: &Position<'_>,
) -> Result<Map<String, Value>> {
    let merged = merge_choices(ctx, schema, name)?;
    let schema = merged.as_ref().unwrap_or(schema);

    let mut node = Map::new();
    if let Some(name) = name {
        node.insert("name".to_string(), Value::String(name.to_string()));
    }

    let (kind, reference) = match resolve_type(ctx, schema, name)? {
        ResolvedType::Inline(kind) => {
            build_inline(ctx, kind, schema, name, &mut node)?;
            (Some(kind), false)
        }
        ResolvedType::Resolved { value, reference } => {
            node.insert("type".to_string(), value);
            (None, reference)
        }
    };

    copy_field_attributes(ctx, schema, &mut node);
    apply_default(schema, position, reference, &mut node);
    attach_meta_properties(schema, kind, &mut node);

    let complex = kind.is_some_and(AvroKind::is_complex);
    if complex && kind != Some(AvroKind::Array) && !node.contains_key("name") {
        assign_name(ctx, schema, position, &mut node);
    }
    if complex && matches!(position, Position::Field { .. }) {
        node = nest_complex_type(node);
    }
    Ok(node)
}

fn build_inline(
    ctx: &mut ForwardContext<'_>,
    kind: AvroKind,
    schema: &Map<String, Value>,
    name: Option<&str>,
    node: &mut Map<String, Value>,
) -> Result<()> {
    let token = Value::String(kind.as_str().to_string());
    let attrs = type_attributes(ctx.table, kind, schema);

    match kind {
        AvroKind::Record => {
            node.insert("type".to_string(), token);
            node.extend(attrs);
            let fields = convert_fields(ctx, schema)?;
            node.insert("fields".to_string(), Value::Array(fields));
        }
        AvroKind::Array => {
            node.insert("type".to_string(), token);
            node.extend(attrs);
            let items = convert_items(ctx, schema, name)?;
            node.insert("items".to_string(), items);
        }
        AvroKind::Map => {
            node.insert("type".to_string(), token);
            node.extend(attrs);
            let values = map_values(ctx, schema, name)?;
            node.insert("values".to_string(), values);
        }
        AvroKind::Enum => {
            node.insert("type".to_string(), token);
            node.extend(attrs);
            node.entry("symbols")
                .or_insert_with(|| Value::Array(Vec::new()));
        }
        AvroKind::Fixed => {
            node.insert("type".to_string(), token);
            node.extend(attrs);
        }
        AvroKind::Null
        | AvroKind::Boolean
        | AvroKind::Int
        | AvroKind::Long
        | AvroKind::Float
        | AvroKind::Double
        | AvroKind::Bytes
        | AvroKind::String => {
            if attrs.is_empty() {
                node.insert("type".to_string(), token);
            } else {
                let mut attributed = Map::new();
                attributed.insert("type".to_string(), token);
                attributed.extend(attrs);
                node.insert("type".to_string(), Value::Object(attributed));
            }
        }
    }
    Ok(())
}

fn required_names(schema: &Map<String, Value>) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn convert_fields(ctx: &mut ForwardContext<'_>, schema: &Map<String, Value>) -> Result<Vec<Value>> {
    let Some(properties) = schema.get("properties") else {
        return Ok(Vec::new());
    };
    let properties = properties.as_object().ok_or_else(|| {
        ConversionError::Structural(format!("properties must be an object, got {properties}"))
    })?;
    let required = required_names(schema);

    let mut fields = Vec::with_capacity(properties.len());
    for (key, property) in properties {
        let Value::Object(property) = property else {
            return Err(ConversionError::Structural(format!(
                "property {key:?} must be an object"
            )));
        };
        let position = Position::Field {
            required: required.contains(&key.as_str()),
        };
        let field = convert_node(ctx, property, Some(key), &position)?;
        fields.push(Value::Object(field));
    }
    Ok(fields)
}

fn convert_items(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Value> {
    let first = match schema.get("items") {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    match first {
        Some(Value::Object(item)) => {
            let converted = convert_node(ctx, item, None, &Position::Item { parent: name })?;
            Ok(type_value(converted))
        }
        _ => Ok(Value::String(DEFAULT_TYPE.to_string())),
    }
}

/// Reduce a converted node to the value that goes into a `type`,
/// `items` or `values` slot.
///
/// Complex kinds keep their body minus field-only attributes; everything
/// else collapses to its `type`, which for a union is the member list.
pub fn type_value(mut node: Map<String, Value>) -> Value {
    let kind = node
        .get("type")
        .and_then(Value::as_str)
        .and_then(AvroKind::parse);
    match kind {
        Some(kind) if kind.is_complex() => {
            node.remove("default");
            node.remove("order");
            if !kind.is_named() {
                node.remove("name");
            }
            Value::Object(node)
        }
        _ => node
            .remove("type")
            .unwrap_or_else(|| Value::String(DEFAULT_TYPE.to_string())),
    }
}

fn copy_field_attributes(
    ctx: &ForwardContext<'_>,
    schema: &Map<String, Value>,
    node: &mut Map<String, Value>,
) {
    for key in ctx.table.field_level() {
        if key == "default" || node.contains_key(key) {
            continue;
        }
        if let Some(value) = schema.get(key) {
            node.insert(key.clone(), value.clone());
        }
    }
}

fn apply_default(
    schema: &Map<String, Value>,
    position: &Position<'_>,
    reference: bool,
    node: &mut Map<String, Value>,
) {
    let avro_type = node.get("type").cloned().unwrap_or(Value::Null);
    match schema.get("default") {
        Some(default) => {
            let required = matches!(position, Position::Field { required: true });
            if required && reference && avro_type.is_object() {
                debug!(name = ?node.get("name"), "dropping default of required complex reference");
                return;
            }
            let coerced = coerce_default(default_kind(&avro_type), default.clone());
            node.insert("default".to_string(), coerced);
        }
        None => {
            let null_first = avro_type
                .as_array()
                .and_then(|members| members.first())
                .is_some_and(|first| first == "null");
            if null_first && matches!(position, Position::Field { .. }) {
                node.insert("default".to_string(), Value::Null);
            }
        }
    }
}
