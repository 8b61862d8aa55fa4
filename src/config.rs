//! Request and option types for the document-level APIs.

use serde::Deserialize;
use serde_json::Value;

use crate::adapt::AdaptOptions;
use crate::forward::DefinitionSources;

/// A forward-engineering request as sent by the host tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    #[serde(default)]
    pub entity_data: EntityData,
    pub json_schema: String,
    #[serde(default)]
    pub container_data: Option<ContainerData>,
    #[serde(default)]
    pub internal_definitions: Option<String>,
    #[serde(default)]
    pub external_definitions: Option<String>,
    #[serde(default)]
    pub model_definitions: Option<String>,
    #[serde(default)]
    pub options: Option<RequestOptions>,
}

impl ForwardRequest {
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| crate::ConversionError::parse("request", e))
    }

    pub fn record_name(&self) -> Option<&str> {
        self.entity_data.record_name()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.container_data
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn definition_sources(&self) -> DefinitionSources {
        DefinitionSources {
            external: self.external_definitions.clone(),
            model: self.model_definitions.clone(),
            internal: self.internal_definitions.clone(),
        }
    }

    pub fn script_options(&self) -> ScriptOptions {
        self.options
            .as_ref()
            .map(ScriptOptions::from)
            .unwrap_or_default()
    }

    pub fn adapt_options(&self) -> AdaptOptions {
        AdaptOptions {
            null_defaults: self
                .options
                .as_ref()
                .is_some_and(|options| options.is_enabled("addNullDefaults")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
}

impl EntityData {
    /// First non-empty of `name`, `code` and `collectionName`.
    pub fn record_name(&self) -> Option<&str> {
        [&self.name, &self.code, &self.collection_name]
            .into_iter()
            .filter_map(|candidate| candidate.as_deref())
            .find(|candidate| !candidate.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerData {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default)]
    pub additional_options: Vec<AdditionalOption>,
    #[serde(default)]
    pub target_script_options: Option<TargetScriptOptions>,
}

impl RequestOptions {
    /// Whether the additional option `id` is present with a truthy value.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.additional_options
            .iter()
            .any(|option| option.id == id && is_truthy(&option.value))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalOption {
    pub id: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetScriptOptions {
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Output post-processing flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptOptions {
    pub minify: bool,
    pub schema_registry: bool,
}

impl From<&RequestOptions> for ScriptOptions {
    fn from(options: &RequestOptions) -> Self {
        let minify = options.is_enabled("minify");
        let schema_registry = options
            .target_script_options
            .as_ref()
            .and_then(|target| target.keyword.as_deref())
            == Some("schemaRegistry");
        Self {
            minify,
            schema_registry,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}
