use serde_json::{Map, Value};

use crate::avro::META_PROPERTIES;

/// Gather Java-interop meta properties into a `metaProps` list.
///
/// Each entry is `{"metaKey": key, <value field>: value}`, where the value
/// field depends on the key. Returns `None` when there are none.
pub fn collect_meta_properties(source: &Map<String, Value>) -> Option<Value> {
    let entries: Vec<Value> = source
        .iter()
        .filter_map(|(key, value)| {
            let (key, field) = META_PROPERTIES.iter().find(|(k, _)| *k == key.as_str())?;
            let mut entry = Map::new();
            entry.insert("metaKey".to_string(), Value::String(key.to_string()));
            entry.insert(field.to_string(), value.clone());
            Some(Value::Object(entry))
        })
        .collect();
    (!entries.is_empty()).then_some(Value::Array(entries))
}
