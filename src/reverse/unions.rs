use serde_json::{Map, Value};

use crate::common::DEFAULT_NAME;
use crate::error::Result;
use crate::reverse::conversion::convert_type;
use crate::reverse::state::ReverseContext;
use crate::reverse::types::kind_of;

/// Whether a union member needs its own choice alternative.
///
/// Primitives, attributed or not, merge into a multi-type; complex kinds
/// and named references do not.
pub fn is_complex_member(member: &Value) -> bool {
    match kind_of(member) {
        Some(kind) => kind.is_complex(),
        None => true,
    }
}

/// Convert an Avro union.
///
/// A union of primitives stays a generic multi-type. Anything else becomes
/// a `choice` node with one `oneOf` alternative per member, each wrapping
/// the converted member under the field's name.
pub fn convert_union(
    ctx: &mut ReverseContext<'_>,
    members: &[Value],
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    if members.iter().any(is_complex_member) || has_mixed_numeric_kinds(members) {
        convert_choice(ctx, members, field_name)
    } else {
        merge_primitives(ctx, members, field_name)
    }
}

/// A generic `number` carries one `mode`, so `["int", "long"]` cannot
/// merge into a single multi-type without losing a member.
fn has_mixed_numeric_kinds(members: &[Value]) -> bool {
    let mut numeric = members
        .iter()
        .filter_map(kind_of)
        .filter(|kind| kind.is_numeric());
    match numeric.next() {
        Some(first) => numeric.any(|kind| kind != first),
        None => false,
    }
}

fn merge_primitives(
    ctx: &mut ReverseContext<'_>,
    members: &[Value],
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    let mut types: Vec<Value> = Vec::with_capacity(members.len());
    let mut attributes = Map::new();
    for member in members {
        let mut converted = convert_type(ctx, member, field_name)?;
        if let Some(token) = converted.remove("type") {
            if !types.contains(&token) {
                types.push(token);
            }
        }
        attributes.extend(converted);
    }

    let mut node = Map::new();
    let type_value = match types.len() {
        1 => types.remove(0),
        _ => Value::Array(types),
    };
    node.insert("type".to_string(), type_value);
    node.extend(attributes);
    Ok(node)
}

fn convert_choice(
    ctx: &mut ReverseContext<'_>,
    members: &[Value],
    field_name: Option<&str>,
) -> Result<Map<String, Value>> {
    let name = field_name.unwrap_or(DEFAULT_NAME);
    let mut items = Vec::with_capacity(members.len());
    for member in members {
        let converted = convert_type(ctx, member, Some(name))?;
        let mut properties = Map::new();
        properties.insert(name.to_string(), Value::Object(converted));

        let mut alternative = Map::new();
        alternative.insert("type".to_string(), Value::String("object".to_string()));
        alternative.insert("properties".to_string(), Value::Object(properties));
        items.push(Value::Object(alternative));
    }

    let mut node = Map::new();
    node.insert("type".to_string(), Value::String("choice".to_string()));
    node.insert("choice".to_string(), Value::String("oneOf".to_string()));
    node.insert("items".to_string(), Value::Array(items));
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyTable;
    use serde_json::json;

    fn convert(members: Value) -> Value {
        let mut ctx = ReverseContext::new(PropertyTable::builtin());
        let members = members.as_array().unwrap().clone();
        Value::Object(convert_union(&mut ctx, &members, Some("value")).unwrap())
    }

    #[test]
    fn primitive_union_stays_multi_type() {
        assert_eq!(
            convert(json!(["null", "long"])),
            json!({"type": ["null", "number"], "mode": "long"})
        );
    }

    #[test]
    fn numeric_members_collapse() {
        assert_eq!(
            convert(json!(["int", {"type": "int", "logicalType": "date"}])),
            json!({"type": "number", "mode": "int", "logicalType": "date"})
        );
    }

    #[test]
    fn distinct_numeric_modes_become_a_choice() {
        assert_eq!(
            convert(json!(["null", "int", "long"])),
            json!({
                "type": "choice",
                "choice": "oneOf",
                "items": [
                    {"type": "object", "properties": {"value": {"type": "null"}}},
                    {"type": "object", "properties": {"value": {"type": "number", "mode": "int"}}},
                    {"type": "object", "properties": {"value": {"type": "number", "mode": "long"}}}
                ]
            })
        );
    }

    #[test]
    fn complex_members_become_a_choice() {
        assert_eq!(
            convert(json!(["null", {"type": "array", "items": "string"}])),
            json!({
                "type": "choice",
                "choice": "oneOf",
                "items": [
                    {"type": "object", "properties": {"value": {"type": "null"}}},
                    {"type": "object", "properties": {"value": {"type": "array", "items": {"type": "string"}}}}
                ]
            })
        );
    }

    #[test]
    fn named_members_are_references() {
        assert!(is_complex_member(&json!("com.acme.Address")));
        assert!(!is_complex_member(&json!({"type": "string", "avro.java.string": "String"})));
    }
}
