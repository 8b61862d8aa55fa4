//! Avro schema diagnostics.
//!
//! A structural walk collects every problem it can find; a schema that
//! passes is then handed to `apache-avro` as the final word.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::avro::AvroKind;
use crate::common::{fullname, is_valid_avro_name, split_qualified_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub label: String,
    pub title: String,
    pub context: String,
}

impl Diagnostic {
    pub fn success() -> Self {
        Self {
            kind: DiagnosticKind::Success,
            label: String::new(),
            title: "Avro schema is valid".to_string(),
            context: String::new(),
        }
    }

    pub fn error(label: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            label: label.into(),
            title: title.into(),
            context: String::new(),
        }
    }
}

/// Validate Avro schema text.
///
/// Returns every problem found, or a single success diagnostic.
pub fn validate(text: &str) -> Vec<Diagnostic> {
    let schema: Value = match serde_json::from_str(text) {
        Ok(schema) => schema,
        Err(err) => return vec![Diagnostic::error("ParseError", err.to_string())],
    };

    let mut lint = Lint::default();
    lint.check_type(&schema, None, "");
    if !lint.diagnostics.is_empty() {
        return lint.diagnostics;
    }

    match apache_avro::Schema::parse_str(text) {
        Ok(_) => vec![Diagnostic::success()],
        Err(err) => vec![Diagnostic::error("", err.to_string())],
    }
}

#[derive(Default)]
struct Lint {
    defined: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Lint {
    fn report(&mut self, label: &str, title: String) {
        self.diagnostics.push(Diagnostic::error(label, title));
    }

    fn check_type(&mut self, avro_type: &Value, namespace: Option<&str>, label: &str) {
        match avro_type {
            Value::String(token) => self.check_reference(token, namespace, label),
            Value::Array(members) => {
                for member in members {
                    if member.is_array() {
                        self.report(label, "Unions may not immediately contain other unions".to_string());
                        continue;
                    }
                    self.check_type(member, namespace, label);
                }
            }
            Value::Object(body) => self.check_object(body, namespace, label),
            other => self.report(label, format!("Invalid type: {other}")),
        }
    }

    fn check_reference(&mut self, token: &str, namespace: Option<&str>, label: &str) {
        match AvroKind::parse(token) {
            Some(kind) if kind.is_primitive() => {}
            Some(kind) => self.report(label, format!("Type {kind} needs a schema object")),
            None => {
                let qualified = fullname(token, namespace);
                if !self.defined.contains(&qualified) && !self.defined.contains(token) {
                    self.report(label, format!("Undefined type: {token}"));
                }
            }
        }
    }

    fn check_object(&mut self, body: &Map<String, Value>, namespace: Option<&str>, label: &str) {
        let token = match body.get("type") {
            Some(Value::String(token)) => token.as_str(),
            Some(nested) => return self.check_type(nested, namespace, label),
            None => return self.report(label, "Missing type".to_string()),
        };
        let Some(kind) = AvroKind::parse(token) else {
            return self.check_reference(token, namespace, label);
        };

        let namespace = if kind.is_named() {
            match self.define(body, namespace, label) {
                Some(ns) => ns,
                None => return,
            }
        } else {
            namespace.map(str::to_string)
        };
        let namespace = namespace.as_deref();

        match kind {
            AvroKind::Record => self.check_fields(body, namespace, label),
            AvroKind::Enum => self.check_symbols(body, label),
            AvroKind::Fixed => {
                if !body.get("size").is_some_and(Value::is_u64) {
                    self.report(label, "Fixed type needs a non-negative integer size".to_string());
                }
            }
            AvroKind::Array => match body.get("items") {
                Some(items) => self.check_type(items, namespace, label),
                None => self.report(label, "Array type needs items".to_string()),
            },
            AvroKind::Map => match body.get("values") {
                Some(values) => self.check_type(values, namespace, label),
                None => self.report(label, "Map type needs values".to_string()),
            },
            _ => {}
        }
    }

    /// Register a named type, returning the namespace its children use.
    fn define(
        &mut self,
        body: &Map<String, Value>,
        namespace: Option<&str>,
        label: &str,
    ) -> Option<Option<String>> {
        let Some(name) = body.get("name").and_then(Value::as_str) else {
            self.report(label, "Named type is missing a name".to_string());
            return None;
        };
        let explicit = body.get("namespace").and_then(Value::as_str);
        let (prefix, local) = split_qualified_name(name);
        let namespace = prefix.or(explicit).or(namespace).filter(|ns| !ns.is_empty());

        if !is_valid_avro_name(local) {
            self.report(name, format!("Invalid name: {name}"));
        }
        let qualified = fullname(local, namespace);
        if !self.defined.insert(qualified.clone()) {
            self.report(name, format!("Duplicate type name: {qualified}"));
        }
        Some(namespace.map(str::to_string))
    }

    fn check_fields(&mut self, body: &Map<String, Value>, namespace: Option<&str>, label: &str) {
        let Some(fields) = body.get("fields").and_then(Value::as_array) else {
            return self.report(label, "Record type needs a list of fields".to_string());
        };
        let mut seen = HashSet::new();
        for field in fields {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                self.report(label, "Field is missing a name".to_string());
                continue;
            };
            if !is_valid_avro_name(name) {
                self.report(name, format!("Invalid field name: {name}"));
            }
            if !seen.insert(name) {
                self.report(name, format!("Duplicate field name: {name}"));
            }
            match field.get("type") {
                Some(avro_type) => self.check_type(avro_type, namespace, name),
                None => self.report(name, "Field is missing a type".to_string()),
            }
        }
    }

    fn check_symbols(&mut self, body: &Map<String, Value>, label: &str) {
        let Some(symbols) = body.get("symbols").and_then(Value::as_array) else {
            return self.report(label, "Enum type needs a list of symbols".to_string());
        };
        let mut seen = HashSet::new();
        for symbol in symbols {
            match symbol.as_str() {
                Some(symbol) if !is_valid_avro_name(symbol) => {
                    self.report(label, format!("Invalid symbol: {symbol}"))
                }
                Some(symbol) if !seen.insert(symbol) => {
                    self.report(label, format!("Duplicate symbol: {symbol}"))
                }
                Some(_) => {}
                None => self.report(label, format!("Invalid symbol: {symbol}")),
            }
        }
    }
}
