use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::avro::{AvroKind, GenericKind};
use crate::common::avro_name;
use crate::error::{ConversionError, Result};
use crate::forward::conversion::{convert_node, type_value, Position};
use crate::forward::state::ForwardContext;

/// The three definition documents a forward call may draw on.
///
/// Each is generic-schema text with a `definitions` object. Layers are
/// applied external → model → internal; a later layer overrides an
/// earlier definition of the same name.
#[derive(Debug, Default, Clone)]
pub struct DefinitionSources {
    pub external: Option<String>,
    pub model: Option<String>,
    pub internal: Option<String>,
}

impl DefinitionSources {
    fn layers(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("externalDefinitions", self.external.as_deref()),
            ("modelDefinitions", self.model.as_deref()),
            ("internalDefinitions", self.internal.as_deref()),
        ]
    }

    /// Parse every non-blank layer, in application order.
    pub fn documents(&self) -> Result<Vec<(&'static str, Value)>> {
        let mut documents = Vec::new();
        for (label, text) in self.layers() {
            let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
                continue;
            };
            let document: Value =
                serde_json::from_str(text).map_err(|e| ConversionError::parse(label, e))?;
            documents.push((label, document));
        }
        Ok(documents)
    }
}

/// User-defined types available to one forward call.
///
/// Named definitions (record, enum, fixed) are consumed the first time
/// they are inlined; later references resolve to the bare name.
#[derive(Debug, Default, Clone)]
pub struct UdtPool {
    definitions: Map<String, Value>,
    consumed: HashSet<String>,
}

impl UdtPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sources(sources: &DefinitionSources) -> Result<Self> {
        Ok(Self::from_documents(sources.documents()?))
    }

    /// Build a pool from already-parsed definition documents, in layer order.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut pool = Self::new();
        for (label, document) in documents {
            let Value::Object(mut document) = document else {
                continue;
            };
            let Some(Value::Object(definitions)) = document.remove("definitions") else {
                continue;
            };
            debug!(layer = label, count = definitions.len(), "loaded definitions");
            for (name, definition) in definitions {
                pool.insert(&name, definition);
            }
        }
        pool
    }

    pub fn insert(&mut self, name: &str, definition: Value) {
        self.definitions.insert(name.to_string(), definition);
    }

    /// Look a definition up by its own name, then by its Avro-safe form.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name).or_else(|| {
            self.definitions
                .iter()
                .find(|(key, _)| avro_name(key) == name)
                .map(|(_, definition)| definition)
        })
    }

    fn key_of(&self, name: &str) -> Option<String> {
        if self.definitions.contains_key(name) {
            return Some(name.to_string());
        }
        self.definitions
            .keys()
            .find(|key| avro_name(key) == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn is_consumed(&self, name: &str) -> bool {
        self.consumed.contains(&avro_name(name))
    }

    /// Remove a definition and remember that its body has been emitted.
    ///
    /// Consumption is tracked by Avro name, so `Home Address` and
    /// `Home_Address` refer to the same emitted type.
    pub fn consume(&mut self, name: &str) -> Option<Value> {
        self.consumed.insert(avro_name(name));
        let key = self.key_of(name)?;
        self.definitions.remove(&key)
    }
}

/// Whether a generic definition becomes an Avro named type.
pub fn is_named_definition(definition: &Map<String, Value>) -> bool {
    match definition.get("type").and_then(Value::as_str) {
        Some(token) => matches!(
            GenericKind::parse(token),
            GenericKind::Avro(AvroKind::Record | AvroKind::Enum | AvroKind::Fixed)
        ),
        None => definition.contains_key("properties") && !definition.contains_key("$ref"),
    }
}

/// Resolve a user-defined type name to an Avro type value.
///
/// Returns `None` when the pool has never heard of `name`.
pub fn resolve_udt(ctx: &mut ForwardContext<'_>, name: &str) -> Result<Option<Value>> {
    if ctx.pool.is_consumed(name) {
        return Ok(Some(Value::String(avro_name(name))));
    }
    let definition = match ctx.pool.get(name) {
        Some(Value::Object(definition)) => definition.clone(),
        Some(literal) => return Ok(Some(literal.clone())),
        None => return Ok(None),
    };

    // Consume before converting so a self-reference resolves to the name.
    if is_named_definition(&definition) {
        ctx.pool.consume(name);
        debug!(name, "inlining user-defined type");
    }
    ctx.enter_definition(name)?;
    let converted = convert_node(
        ctx,
        &definition,
        Some(name),
        &Position::Item { parent: Some(name) },
    );
    ctx.exit_definition();
    Ok(Some(type_value(converted?)))
}
