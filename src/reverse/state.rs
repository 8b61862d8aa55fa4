use serde_json::{Map, Value};
use tracing::debug;

use crate::properties::PropertyTable;

/// Mutable state of one reverse conversion call.
///
/// `definitions` collects every named type hoisted out of the tree;
/// `records` is the chain of records currently being converted, used to
/// spot a record that refers to one of its ancestors.
pub struct ReverseContext<'a> {
    pub table: &'a PropertyTable,
    definitions: Map<String, Value>,
    records: Vec<String>,
}

impl<'a> ReverseContext<'a> {
    pub fn new(table: &'a PropertyTable) -> Self {
        Self {
            table,
            definitions: Map::new(),
            records: Vec::new(),
        }
    }

    pub fn enter_record(&mut self, name: &str) {
        self.records.push(name.to_string());
    }

    pub fn exit_record(&mut self) {
        self.records.pop();
    }

    /// Whether `name` is a record currently being converted.
    pub fn is_enclosing_record(&self, name: &str) -> bool {
        self.records.iter().any(|record| record == name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Store a hoisted named type. The first definition of a name wins.
    pub fn define(&mut self, name: &str, definition: Map<String, Value>) {
        if self.is_defined(name) {
            return;
        }
        debug!(name, "hoisted named type into definitions");
        self.definitions
            .insert(name.to_string(), Value::Object(definition));
    }

    pub fn into_definitions(self) -> Map<String, Value> {
        self.definitions
    }
}
