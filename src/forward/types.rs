use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::avro::{numeric_kind, AvroKind, GenericKind, DEFAULT_TYPE};
use crate::common::{avro_name, ref_target};
use crate::error::{ConversionError, Result};
use crate::forward::choices::choice_members;
use crate::forward::conversion::{convert_node, type_value, Position};
use crate::forward::state::ForwardContext;
use crate::forward::udt::resolve_udt;
use crate::properties::PropertyTable;

static MAP_SUBTYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^map<(.*)>$").unwrap());

/// Attributes that turn a union member into an attributed type object.
const MEMBER_ATTRIBUTES: [&str; 2] = ["order", "aliases"];

/// Outcome of mapping a node's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    /// The node itself is built as this kind.
    Inline(AvroKind),
    /// A finished Avro type: a union, a nested type, or a user-defined
    /// type (`reference`).
    Resolved { value: Value, reference: bool },
}

fn mode(schema: &Map<String, Value>) -> Option<&str> {
    schema.get("mode").and_then(Value::as_str)
}

/// Map the declared type of a generic node.
pub fn resolve_type(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<ResolvedType> {
    if let Some(reference) = schema.get("$ref") {
        let reference = reference
            .as_str()
            .ok_or_else(|| ConversionError::Structural(format!("$ref must be a string, got {reference}")))?;
        let target = ref_target(reference)
            .ok_or_else(|| ConversionError::Structural(format!("malformed $ref {reference:?}")))?;
        return match resolve_udt(ctx, target)? {
            Some(value) => Ok(ResolvedType::Resolved {
                value,
                reference: true,
            }),
            None => Err(ConversionError::Structural(format!(
                "unresolvable $ref {reference:?}"
            ))),
        };
    }

    match schema.get("type") {
        None | Some(Value::Null) => Ok(ResolvedType::Inline(implicit_kind(schema))),
        Some(Value::String(token)) => map_token(ctx, token, schema, name),
        Some(Value::Array(members)) => {
            let members = union_members(ctx, members, schema, name)?;
            Ok(ResolvedType::Resolved {
                value: Value::Array(members),
                reference: false,
            })
        }
        Some(Value::Object(nested)) => {
            let converted = convert_node(ctx, nested, None, &Position::Item { parent: name })?;
            Ok(ResolvedType::Resolved {
                value: type_value(converted),
                reference: false,
            })
        }
        Some(other) => Err(ConversionError::Structural(format!(
            "unsupported type declaration {other}"
        ))),
    }
}

fn implicit_kind(schema: &Map<String, Value>) -> AvroKind {
    if schema.contains_key("properties") {
        AvroKind::Record
    } else if schema.contains_key("items") {
        AvroKind::Array
    } else {
        AvroKind::String
    }
}

fn map_token(
    ctx: &mut ForwardContext<'_>,
    token: &str,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<ResolvedType> {
    match GenericKind::parse(token) {
        GenericKind::Avro(kind) => Ok(ResolvedType::Inline(kind)),
        GenericKind::Number => Ok(ResolvedType::Inline(numeric_kind(mode(schema)))),
        GenericKind::Choice => {
            let members = choice_members(ctx, schema.get("items"), name)?;
            if members.is_empty() {
                warn!(?name, "choice without alternatives, defaulting to {DEFAULT_TYPE}");
                return Ok(ResolvedType::Inline(AvroKind::String));
            }
            Ok(ResolvedType::Resolved {
                value: Value::Array(members),
                reference: false,
            })
        }
        GenericKind::Unknown(token) => match resolve_udt(ctx, &token)? {
            Some(value) => Ok(ResolvedType::Resolved {
                value,
                reference: true,
            }),
            None => {
                warn!(token = %token, "unknown type, defaulting to {DEFAULT_TYPE}");
                Ok(ResolvedType::Inline(AvroKind::String))
            }
        },
    }
}

/// Map every member of a multi-type declaration, dropping duplicates.
pub fn union_members(
    ctx: &mut ForwardContext<'_>,
    members: &[Value],
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(members.len());
    for member in members {
        let value = match member {
            Value::String(token) => member_for_token(ctx, token, schema, name)?,
            // Already an Avro type, e.g. a merged choice alternative.
            Value::Object(_) => member.clone(),
            other => {
                return Err(ConversionError::Structural(format!(
                    "unsupported union member {other}"
                )))
            }
        };
        push_unique(&mut out, value);
    }
    Ok(out)
}

/// Append `value` unless the same member is present; nested unions are
/// flattened into `members`.
///
/// A named type's body and a later reference to its name are the same
/// member.
pub fn push_unique(members: &mut Vec<Value>, value: Value) {
    match value {
        Value::Array(inner) => {
            for member in inner {
                push_unique(members, member);
            }
        }
        value => {
            let duplicate = match named_identity(&value) {
                Some(name) => members
                    .iter()
                    .any(|member| named_identity(member).as_deref() == Some(name.as_str())),
                None => members.contains(&value),
            };
            if !duplicate {
                members.push(value);
            }
        }
    }
}

/// The Avro name a union member stands for, when it is a named type
/// body or a reference to one.
fn named_identity(member: &Value) -> Option<String> {
    match member {
        Value::String(token) if AvroKind::parse(token).is_none() => Some(avro_name(token)),
        Value::Object(body) => {
            let kind = body.get("type").and_then(Value::as_str).and_then(AvroKind::parse)?;
            if !kind.is_named() {
                return None;
            }
            body.get("name").and_then(Value::as_str).map(avro_name)
        }
        _ => None,
    }
}

fn member_for_token(
    ctx: &mut ForwardContext<'_>,
    token: &str,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Value> {
    match GenericKind::parse(token) {
        GenericKind::Avro(kind) if kind.is_primitive() => Ok(attributed_member(ctx.table, kind, schema)),
        GenericKind::Number => Ok(attributed_member(ctx.table, numeric_kind(mode(schema)), schema)),
        GenericKind::Avro(_) => {
            let mut single = schema.clone();
            single.insert("type".to_string(), Value::String(token.to_string()));
            let converted = convert_node(ctx, &single, name, &Position::Item { parent: name })?;
            Ok(type_value(converted))
        }
        GenericKind::Choice => Err(ConversionError::Structural(
            "a choice cannot be a member of a multi-type declaration".into(),
        )),
        GenericKind::Unknown(token) => match resolve_udt(ctx, &token)? {
            Some(value) => Ok(value),
            None => {
                warn!(token = %token, "unknown union member, defaulting to {DEFAULT_TYPE}");
                Ok(Value::String(DEFAULT_TYPE.to_string()))
            }
        },
    }
}

/// A primitive union member, promoted to `{type, ...}` when the node
/// carries attributes Avro attaches to the type.
fn attributed_member(table: &PropertyTable, kind: AvroKind, schema: &Map<String, Value>) -> Value {
    let token = Value::String(kind.as_str().to_string());
    if kind == AvroKind::Null {
        return token;
    }
    let mut attrs = Map::new();
    for key in MEMBER_ATTRIBUTES {
        if let Some(value) = schema.get(key) {
            attrs.insert(key.to_string(), value.clone());
        }
    }
    attrs.extend(type_attributes(table, kind, schema));
    if attrs.is_empty() {
        return token;
    }
    let mut member = Map::new();
    member.insert("type".to_string(), token);
    member.extend(attrs);
    Value::Object(member)
}

/// Type-level attributes of `schema` that the property table allows on
/// `kind`. Logical types outside the allow-list are dropped.
pub fn type_attributes(
    table: &PropertyTable,
    kind: AvroKind,
    schema: &Map<String, Value>,
) -> Map<String, Value> {
    let mut attrs = Map::new();
    for key in table.allowed(kind, schema) {
        let Some(value) = schema.get(key) else {
            continue;
        };
        match key {
            "logicalType" => match value.as_str() {
                Some(logical) if kind.allows_logical_type(logical) => {
                    attrs.insert(key.to_string(), value.clone());
                }
                _ => warn!(%kind, logical_type = %value, "dropping unsupported logical type"),
            },
            "size" => {
                attrs.insert(key.to_string(), coerce_number(value));
            }
            _ => {
                attrs.insert(key.to_string(), value.clone());
            }
        }
    }
    if kind == AvroKind::Fixed
        && !attrs.contains_key("size")
        && attrs.get("logicalType").and_then(Value::as_str) == Some("duration")
    {
        let size = schema.get("durationSize").map_or(Value::from(12), coerce_number);
        attrs.insert("size".to_string(), size);
    }
    attrs
}

fn coerce_number(value: &Value) -> Value {
    match value {
        Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

/// Value type of a generic `map` node, read from its `map<inner>` subtype.
pub fn map_values(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Value> {
    let subtype = schema.get("subtype").and_then(Value::as_str).unwrap_or_default();
    values_for_subtype(ctx, subtype, schema, name)
}

fn values_for_subtype(
    ctx: &mut ForwardContext<'_>,
    subtype: &str,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Value> {
    let Some(inner) = MAP_SUBTYPE
        .captures(subtype.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| !inner.is_empty())
    else {
        return Ok(Value::String(DEFAULT_TYPE.to_string()));
    };

    if inner.starts_with("map<") {
        let nested = values_for_subtype(ctx, inner, schema, name)?;
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String("map".to_string()));
        map.insert("values".to_string(), nested);
        return Ok(Value::Object(map));
    }

    match GenericKind::parse(inner) {
        GenericKind::Avro(kind) if kind.is_primitive() => Ok(Value::String(kind.as_str().to_string())),
        GenericKind::Number => Ok(Value::String(numeric_kind(None).as_str().to_string())),
        GenericKind::Avro(kind) => {
            // The map node's own children describe the value type.
            let mut single = schema.clone();
            single.insert("type".to_string(), Value::String(kind.as_str().to_string()));
            single.remove("subtype");
            let converted = convert_node(ctx, &single, None, &Position::Item { parent: name })?;
            Ok(type_value(converted))
        }
        GenericKind::Choice => Ok(Value::String(DEFAULT_TYPE.to_string())),
        GenericKind::Unknown(token) => Ok(resolve_udt(ctx, &token)?
            .unwrap_or_else(|| Value::String(DEFAULT_TYPE.to_string()))),
    }
}
