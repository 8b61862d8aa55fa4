//! Forward engine: generic schema → Avro.
//!
//! [`convert_node`] is the recursive core. Everything a single call needs
//! (property table, user-defined type pool, placeholder name counter)
//! lives in a [`ForwardContext`] created per call, so nothing leaks
//! between conversions.

pub mod choices;
pub mod conversion;
pub mod postprocess;
pub mod state;
pub mod structure;
pub mod types;
pub mod udt;

pub use conversion::{convert_node, type_value, Position};
pub use postprocess::{render, reorder_fields_last};
pub use state::ForwardContext;
pub use udt::{DefinitionSources, UdtPool};

use serde_json::{Map, Value};
use tracing::debug;

use crate::adapt::prepare_generic_schema;
use crate::common::avro_namespace;
use crate::config::{ForwardRequest, ScriptOptions};
use crate::error::{ConversionError, Result};
use crate::properties::PropertyTable;

/// Convert a parsed generic schema into an Avro record document.
///
/// The root is always emitted as a `record`. `namespace` follows the
/// record name; `fields` is the last key.
pub fn forward_document(
    root: &Value,
    entity_name: Option<&str>,
    namespace: Option<&str>,
    pool: UdtPool,
    table: &PropertyTable,
) -> Result<Value> {
    let Value::Object(root) = root else {
        return Err(ConversionError::Structural(format!(
            "root schema must be an object, got {root}"
        )));
    };
    let mut root = root.clone();
    root.insert("type".to_string(), Value::String("record".to_string()));
    root.remove("$ref");

    debug!(definitions = pool.len(), "starting forward conversion");
    let mut ctx = ForwardContext::new(table, pool);
    let entity_name = entity_name.filter(|name| !name.is_empty());
    let node = convert_node(&mut ctx, &root, entity_name, &Position::Root)?;

    let node = match namespace.map(avro_namespace).filter(|ns| !ns.is_empty()) {
        Some(namespace) => with_namespace(node, namespace),
        None => node,
    };
    let document = structure::sanitize_avro_names(Value::Object(node));
    structure::ensure_unique_field_names(&document)?;
    Ok(reorder_fields_last(document))
}

fn with_namespace(node: Map<String, Value>, namespace: String) -> Map<String, Value> {
    let mut out = Map::with_capacity(node.len() + 1);
    let mut namespace = Some(Value::String(namespace));
    for (key, value) in node {
        if key == "namespace" {
            continue;
        }
        let after_name = key == "name";
        out.insert(key, value);
        if after_name {
            if let Some(namespace) = namespace.take() {
                out.insert("namespace".to_string(), namespace);
            }
        }
    }
    if let Some(namespace) = namespace {
        out.insert("namespace".to_string(), namespace);
    }
    out
}

/// Convert a generic schema to pretty-printed Avro schema text.
pub fn convert_forward(
    root: &Value,
    entity_name: Option<&str>,
    namespace: Option<&str>,
    sources: &DefinitionSources,
) -> Result<String> {
    let pool = UdtPool::from_sources(sources)?;
    let document = forward_document(root, entity_name, namespace, pool, PropertyTable::builtin())?;
    render(&document, &ScriptOptions::default())
}

/// Produce the Avro script for a host request, using the builtin table.
pub fn generate_script(request: &ForwardRequest) -> Result<String> {
    generate_script_with(request, PropertyTable::builtin())
}

/// As [`generate_script`], with an injected property table.
pub fn generate_script_with(request: &ForwardRequest, table: &PropertyTable) -> Result<String> {
    let adapt = request.adapt_options();
    let root: Value = serde_json::from_str(&request.json_schema)
        .map_err(|e| ConversionError::parse("jsonSchema", e))?;
    let root = prepare_generic_schema(root, adapt);

    let documents = request
        .definition_sources()
        .documents()?
        .into_iter()
        .map(|(label, document)| (label, prepare_generic_schema(document, adapt)));
    let pool = UdtPool::from_documents(documents);

    let document = forward_document(
        &root,
        request.record_name(),
        request.namespace(),
        pool,
        table,
    )?;
    render(&document, &request.script_options())
}
