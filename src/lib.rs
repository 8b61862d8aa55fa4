//! # avrobridge
//!
//! Convert between a JSON-Schema-flavoured data model and
//! [Apache Avro](https://avro.apache.org/) schemas, in both directions.
//!
//! ## Features
//!
//! - Forward engineering: generic schema → Avro record schema, with
//!   user-defined type pools, `oneOf`/`allOf` choice merging, logical
//!   types and Java-interop meta properties
//! - Reverse engineering: `.avsc` text or `.avro` container files →
//!   generic schema, with named types hoisted into `definitions`
//! - Avro schema validation with every problem reported
//! - CLI tool `avrobridge`
//!
//! ## Example (Programmatic Usage)
//!
//! ```no_run
//! use serde_json::json;
//! use avrobridge::forward::{convert_forward, DefinitionSources};
//! use avrobridge::reverse::reverse_document;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "age": { "type": "number", "mode": "long" }
//!     },
//!     "required": ["age"]
//! });
//!
//! let avro = convert_forward(&schema, Some("Person"), Some("com.acme"), &DefinitionSources::default())?;
//! let generic = reverse_document(&avro)?;
//! println!("{}", generic.schema);
//! # Ok::<(), avrobridge::ConversionError>(())
//! ```
//!
//! ## Example (CLI)
//!
//! ```bash
//! avrobridge forward person.json --name Person --namespace com.acme
//! avrobridge reverse users.avro
//! avrobridge validate person.avsc
//! ```
//!
//! ## Crate Layout
//!
//! - [`avro`]: Avro and generic type vocabularies
//! - [`properties`]: per-type property allow-list
//! - [`common`]: names, tree traversal, defaults, ordering
//! - [`forward`]: generic schema → Avro
//! - [`reverse`]: Avro → generic schema
//! - [`adapt`]: generic schema adaptation passes
//! - [`validation`]: Avro schema diagnostics
//! - [`config`]: request and output options
//! - [`error`]: error taxonomy
//!
//! The CLI binary is enabled with the `cli` feature.
pub mod adapt;
pub mod avro;
pub mod common;
pub mod config;
pub mod error;
pub mod forward;
pub mod properties;
pub mod reverse;
pub mod validation;

pub use error::{ConversionError, ErrorReport, Result};
