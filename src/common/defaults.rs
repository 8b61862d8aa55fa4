use serde_json::Value;

use crate::avro::AvroKind;

/// The kind that decides how a field's `default` is read: the type itself,
/// or the first member of a union.
pub fn default_kind(avro_type: &Value) -> Option<AvroKind> {
    match avro_type {
        Value::String(token) => AvroKind::parse(token),
        Value::Array(members) => members.first().and_then(default_kind),
        Value::Object(obj) => obj.get("type").and_then(default_kind),
        _ => None,
    }
}

/// Coerce a `default` literal for the kind it annotates.
///
/// Only a `null`-typed default spelled as the string `"null"` changes;
/// every other literal passes through untouched.
pub fn coerce_default(kind: Option<AvroKind>, default: Value) -> Value {
    match kind {
        Some(AvroKind::Null) if default.as_str() == Some("null") => Value::Null,
        Some(_) | None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_string_becomes_null_for_null_first_unions() {
        let kind = default_kind(&json!(["null", "string"]));
        assert_eq!(kind, Some(AvroKind::Null));
        assert_eq!(coerce_default(kind, json!("null")), Value::Null);
    }

    #[test]
    fn other_defaults_pass_through() {
        assert_eq!(coerce_default(Some(AvroKind::String), json!("null")), json!("null"));
        assert_eq!(coerce_default(Some(AvroKind::Boolean), json!(false)), json!(false));
        assert_eq!(coerce_default(None, json!(0)), json!(0));
        assert_eq!(default_kind(&json!({"type": "long"})), Some(AvroKind::Long));
        assert_eq!(default_kind(&json!("Address")), None);
    }
}
