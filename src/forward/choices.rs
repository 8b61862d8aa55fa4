use serde_json::{Map, Value};
use tracing::debug;

use crate::common::{splice_by_index, Placement};
use crate::error::{ConversionError, Result};
use crate::forward::conversion::{convert_node, type_value, Position};
use crate::forward::state::ForwardContext;
use crate::forward::types::push_unique;

/// Attributes of a `*_meta` sidecar copied onto the synthesized field.
const META_FIELD_ATTRIBUTES: [&str; 2] = ["doc", "default"];

/// The `oneOf_meta` / `allOf_meta` sidecar of a choice.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChoiceMeta {
    pub name: Option<String>,
    pub index: Option<usize>,
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub attributes: Map<String, Value>,
}

impl ChoiceMeta {
    pub fn read(meta: Option<&Value>) -> Self {
        let Some(meta) = meta.and_then(Value::as_object) else {
            return Self::default();
        };
        let index = meta.get("index").and_then(|index| match index {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let ids = meta.get("ids").and_then(Value::as_array).map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect()
        });
        let attributes = META_FIELD_ATTRIBUTES
            .iter()
            .filter_map(|key| meta.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Self {
            name: meta
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            index,
            id: meta.get("id").and_then(Value::as_str).map(str::to_string),
            ids,
            attributes,
        }
    }

    /// Whether a stacked choice passes this sidecar's `ids` filter.
    fn admits(&self, stacked: &ChoiceMeta) -> bool {
        match (&self.ids, &stacked.id) {
            (None, _) => true,
            (Some(ids), Some(id)) => ids.contains(id),
            (Some(_), None) => false,
        }
    }
}

pub fn has_choice(schema: &Map<String, Value>) -> bool {
    schema.contains_key("oneOf") || schema.contains_key("allOf")
}

/// Fold `oneOf` / `allOf` alternatives into the node.
///
/// Returns `None` when the node has no choice. Property-bearing
/// alternatives become one synthesized field each choice; alternatives
/// that are bare types turn the node itself into a union.
pub fn merge_choices(
    ctx: &mut ForwardContext<'_>,
    schema: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Option<Map<String, Value>>> {
    if !has_choice(schema) {
        return Ok(None);
    }
    let mut node = schema.clone();
    let mut placements = Vec::new();

    let one_of = node.remove("oneOf");
    let one_of_meta = ChoiceMeta::read(node.remove("oneOf_meta").as_ref());
    if let Some(alternatives) = one_of {
        let alternatives = as_alternatives(&alternatives)?;
        if is_bare_union(&node, alternatives) {
            let (members, _) = collect_members(ctx, alternatives, name)?;
            node.insert("type".to_string(), Value::Array(members));
        } else {
            placements.push(synthesize(ctx, alternatives, &one_of_meta)?);
        }
    }

    let all_of = node.remove("allOf");
    let all_of_meta = ChoiceMeta::read(node.remove("allOf_meta").as_ref());
    if let Some(entries) = all_of {
        let entries = as_alternatives(&entries)?;
        let (stacked, plain): (Vec<&Value>, Vec<&Value>) =
            entries.iter().partition(|entry| entry.get("oneOf").is_some());

        for entry in stacked {
            let meta = ChoiceMeta::read(entry.get("oneOf_meta"));
            if !all_of_meta.admits(&meta) {
                debug!(id = ?meta.id, "stacked choice filtered out by ids");
                continue;
            }
            let alternatives = entry.get("oneOf").map(as_alternatives).transpose()?.unwrap_or_default();
            placements.push(synthesize(ctx, alternatives, &meta)?);
        }
        if !plain.is_empty() {
            let plain: Vec<Value> = plain.into_iter().cloned().collect();
            placements.push(synthesize(ctx, &plain, &all_of_meta)?);
        }
    }

    if !placements.is_empty() {
        let properties = match node.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };
        node.insert(
            "properties".to_string(),
            Value::Object(splice_by_index(properties, placements)),
        );
    }
    Ok(Some(node))
}

fn as_alternatives(value: &Value) -> Result<&[Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ConversionError::Structural(format!("choice must be a list, got {value}")))
}

/// A field-level `oneOf` of plain types, as opposed to a record choice.
fn is_bare_union(node: &Map<String, Value>, alternatives: &[Value]) -> bool {
    let record_like = node.contains_key("properties")
        || matches!(
            node.get("type").and_then(Value::as_str),
            Some("object" | "record")
        );
    !record_like
        && alternatives
            .iter()
            .all(|alt| alt.get("properties").is_none())
}

fn synthesize(
    ctx: &mut ForwardContext<'_>,
    alternatives: &[Value],
    meta: &ChoiceMeta,
) -> Result<Placement> {
    let (members, first_name) = collect_members(ctx, alternatives, meta.name.as_deref())?;
    let name = match meta.name.clone().or(first_name) {
        Some(name) => name,
        None => ctx.names.next_name(),
    };
    let mut node = Map::new();
    node.insert("type".to_string(), Value::Array(members));
    node.extend(meta.attributes.clone());
    Ok(Placement {
        index: meta.index,
        name,
        node: Value::Object(node),
    })
}

/// Members of a `type: "choice"` node, read from its `items`.
pub fn choice_members(
    ctx: &mut ForwardContext<'_>,
    items: Option<&Value>,
    name: Option<&str>,
) -> Result<Vec<Value>> {
    let members = match items {
        Some(Value::Array(alternatives)) => collect_members(ctx, alternatives, name)?.0,
        Some(single @ Value::Object(_)) => {
            collect_members(ctx, std::slice::from_ref(single), name)?.0
        }
        _ => Vec::new(),
    };
    Ok(members)
}

/// Convert every alternative to an Avro union member.
///
/// Returns the distinct members plus the name of the first alternative
/// property seen.
fn collect_members(
    ctx: &mut ForwardContext<'_>,
    alternatives: &[Value],
    fallback_name: Option<&str>,
) -> Result<(Vec<Value>, Option<String>)> {
    let mut members = Vec::new();
    let mut first_name = None;
    for alternative in alternatives {
        let Value::Object(alternative) = alternative else {
            return Err(ConversionError::Structural(format!(
                "choice alternative must be an object, got {alternative}"
            )));
        };
        match alternative.get("properties") {
            Some(Value::Object(properties)) => {
                for (key, property) in properties {
                    let Value::Object(property) = property else {
                        return Err(ConversionError::Structural(format!(
                            "property {key:?} of a choice alternative must be an object"
                        )));
                    };
                    first_name.get_or_insert_with(|| key.clone());
                    let member = member_value(ctx, property, Some(key))?;
                    push_unique(&mut members, member);
                }
            }
            _ => {
                let member = member_value(ctx, alternative, fallback_name)?;
                push_unique(&mut members, member);
            }
        }
    }
    Ok((members, first_name))
}

fn member_value(
    ctx: &mut ForwardContext<'_>,
    node: &Map<String, Value>,
    name: Option<&str>,
) -> Result<Value> {
    let converted = convert_node(ctx, node, name, &Position::Item { parent: name })?;
    Ok(type_value(converted))
}
