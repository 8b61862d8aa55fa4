//! Per-type property allow-list.
//!
//! The table is data: a versioned JSON resource embedded at build time.
//! Callers that need a different version load their own with
//! [`PropertyTable::from_json`] and hand it to the engines.

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::avro::AvroKind;
use crate::error::{ConversionError, Result};

const BUILTIN_TABLE: &str = include_str!("../resources/avro_properties.json");

static BUILTIN: Lazy<PropertyTable> = Lazy::new(|| {
    PropertyTable::from_json(BUILTIN_TABLE).expect("embedded property table is valid JSON")
});

/// A property that only applies when another attribute has a given value.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Dependency {
    pub key: String,
    pub equals: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRule {
    pub name: String,
    #[serde(default)]
    pub depends_on: Option<Dependency>,
}

impl PropertyRule {
    fn applies_to(&self, node: &Map<String, Value>) -> bool {
        match &self.depends_on {
            Some(dep) => node.get(&dep.key) == Some(&dep.equals),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTable {
    pub version: u32,
    field_level: Vec<String>,
    types: HashMap<String, Vec<PropertyRule>>,
}

impl PropertyTable {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ConversionError::parse("property table", e))
    }

    /// The table shipped with the crate.
    pub fn builtin() -> &'static PropertyTable {
        &BUILTIN
    }

    /// Attributes Avro defines on a record field rather than on its type.
    pub fn field_level(&self) -> &[String] {
        &self.field_level
    }

    pub fn is_field_level(&self, key: &str) -> bool {
        self.field_level.iter().any(|k| k == key)
    }

    pub fn rules(&self, kind: AvroKind) -> &[PropertyRule] {
        self.types
            .get(kind.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Type-level property names allowed on `kind`, given the attributes
    /// present on `node` (used to evaluate dependencies).
    pub fn allowed<'a>(
        &'a self,
        kind: AvroKind,
        node: &'a Map<String, Value>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.rules(kind)
            .iter()
            .filter(move |rule| rule.applies_to(node))
            .map(|rule| rule.name.as_str())
    }

    pub fn is_allowed(&self, kind: AvroKind, key: &str, node: &Map<String, Value>) -> bool {
        self.allowed(kind, node).any(|name| name == key)
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_table_covers_every_kind() {
        let table = PropertyTable::builtin();
        for kind in AvroKind::ALL {
            assert!(table.types.contains_key(kind.as_str()), "{kind}");
        }
        assert!(table.is_field_level("order"));
    }

    #[test]
    fn precision_depends_on_decimal() {
        let table = PropertyTable::builtin();
        let decimal = json!({"logicalType": "decimal"});
        let plain = json!({});
        assert!(table.is_allowed(AvroKind::Bytes, "precision", decimal.as_object().unwrap()));
        assert!(!table.is_allowed(AvroKind::Bytes, "precision", plain.as_object().unwrap()));
        assert!(!table.is_allowed(AvroKind::String, "logicalType", plain.as_object().unwrap()));
    }

    #[test]
    fn injected_table_replaces_builtin() {
        let table = PropertyTable::from_json(
            r#"{"version": 2, "fieldLevel": ["doc"], "types": {"string": [{"name": "logicalType"}]}}"#,
        )
        .unwrap();
        let node = json!({});
        assert_eq!(table.version, 2);
        assert!(table.is_allowed(AvroKind::String, "logicalType", node.as_object().unwrap()));
        assert!(table.rules(AvroKind::Record).is_empty());
    }
}
