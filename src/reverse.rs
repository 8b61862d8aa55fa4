//! Reverse engine: Avro → generic schema.
//!
//! Named types met anywhere below the root are hoisted into the
//! document's `definitions` and referenced with `$ref`.

pub mod conversion;
pub mod meta;
pub mod source;
pub mod state;
pub mod types;
pub mod unions;

pub use conversion::convert_type;
pub use source::{AvroContainerDecoder, ContainerDecoder};
pub use state::ReverseContext;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::avro::AvroKind;
use crate::common::{split_qualified_name, DEFAULT_NAME};
use crate::error::{ConversionError, Result};
use crate::forward::postprocess::to_pretty_string;
use crate::properties::PropertyTable;

pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-04/schema#";

/// A converted generic-schema document and the namespace split off its
/// record name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseDocument {
    pub schema: Value,
    pub container_name: Option<String>,
}

/// What the host receives from reverse engineering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseOutput {
    pub json_schema: String,
    pub extension: Option<String>,
    pub container_name: Option<String>,
}

/// Convert Avro schema text into a generic-schema document.
pub fn reverse_document(text: &str) -> Result<ReverseDocument> {
    reverse_document_with(text, PropertyTable::builtin())
}

pub fn reverse_document_with(text: &str, table: &PropertyTable) -> Result<ReverseDocument> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| ConversionError::parse("avroSchema", e))?;
    let Value::Object(root) = root else {
        return Err(ConversionError::Structural(
            "root Avro schema must be a record object".to_string(),
        ));
    };
    if root.get("type").and_then(Value::as_str) != Some("record") {
        return Err(ConversionError::Structural(format!(
            "root Avro schema must be a record, got {}",
            root.get("type").unwrap_or(&Value::Null)
        )));
    }

    let full_name = root
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_NAME);
    let (prefix, title) = split_qualified_name(full_name);

    let mut ctx = ReverseContext::new(table);
    ctx.enter_record(title);
    let mut body = conversion::convert_body(&mut ctx, AvroKind::Record, &root, None)?;
    ctx.exit_record();

    let namespace = body.remove("namespace");
    let container_name = prefix
        .map(str::to_string)
        .or_else(|| namespace.as_ref().and_then(Value::as_str).map(str::to_string))
        .filter(|name| !name.is_empty());
    body.remove("type");

    let definitions = ctx.into_definitions();
    debug!(definitions = definitions.len(), "finished reverse conversion");

    let mut schema = Map::new();
    schema.insert("$schema".to_string(), Value::String(JSON_SCHEMA_DRAFT.to_string()));
    schema.insert("title".to_string(), Value::String(title.to_string()));
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.extend(body);
    if !definitions.is_empty() {
        schema.insert("definitions".to_string(), Value::Object(definitions));
    }

    Ok(ReverseDocument {
        schema: Value::Object(schema),
        container_name,
    })
}

/// Convert Avro schema text, rendering the result for the host.
pub fn convert_reverse(text: &str) -> Result<ReverseOutput> {
    let document = reverse_document(text)?;
    Ok(ReverseOutput {
        json_schema: to_pretty_string(&document.schema)?,
        extension: None,
        container_name: document.container_name,
    })
}

/// Reverse-engineer an `.avsc` schema or `.avro` container file.
pub fn reverse_from_file(path: &Path, decoder: &dyn ContainerDecoder) -> Result<ReverseOutput> {
    let source = source::read_schema_source(path, decoder)?;
    let mut output = convert_reverse(&source.text)?;
    output.extension = Some(source.extension);
    Ok(output)
}
