use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::config::ScriptOptions;
use crate::error::{ConversionError, Result};

/// Emit the root's `fields` after every other key.
pub fn reorder_fields_last(document: Value) -> Value {
    let Value::Object(mut root) = document else {
        return document;
    };
    if let Some(fields) = root.remove("fields") {
        root.insert("fields".to_string(), fields);
    }
    Value::Object(root)
}

/// Serialize an Avro document according to the script options.
///
/// Pretty output uses a four-space indent. The schema-registry envelope
/// carries the schema as compact text under `schema`.
pub fn render(document: &Value, options: &ScriptOptions) -> Result<String> {
    let output = if options.schema_registry {
        let schema = serde_json::to_string(document).map_err(serialize_error)?;
        let mut envelope = Map::new();
        envelope.insert("schema".to_string(), Value::String(schema));
        Value::Object(envelope)
    } else {
        document.clone()
    };

    if options.minify {
        serde_json::to_string(&output).map_err(serialize_error)
    } else {
        to_pretty_string(&output)
    }
}

pub fn to_pretty_string(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).map_err(serialize_error)?;
    String::from_utf8(buf).map_err(|e| ConversionError::Structural(e.to_string()))
}

fn serialize_error(err: serde_json::Error) -> ConversionError {
    ConversionError::Structural(format!("failed to serialize schema: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_move_to_the_end() {
        let doc = json!({"name": "A", "fields": [], "type": "record", "namespace": "n"});
        let keys: Vec<String> = reorder_fields_last(doc)
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, ["name", "type", "namespace", "fields"]);
    }

    #[test]
    fn renders_each_output_flavour() {
        let doc = json!({"name": "A", "type": "record", "fields": []});
        assert_eq!(
            render(&doc, &ScriptOptions::default()).unwrap(),
            "{\n    \"name\": \"A\",\n    \"type\": \"record\",\n    \"fields\": []\n}"
        );
        let minified = ScriptOptions {
            minify: true,
            schema_registry: false,
        };
        assert_eq!(
            render(&doc, &minified).unwrap(),
            r#"{"name":"A","type":"record","fields":[]}"#
        );
        let registry = ScriptOptions {
            minify: true,
            schema_registry: true,
        };
        assert_eq!(
            render(&doc, &registry).unwrap(),
            r#"{"schema":"{\"name\":\"A\",\"type\":\"record\",\"fields\":[]}"}"#
        );
    }
}
