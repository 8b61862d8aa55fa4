#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(
    name = "avrobridge",
    about = "Convert between JSON-Schema-style models and Avro schemas"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Command {
    /// Generic schema → Avro schema
    Forward(ForwardArgs),
    /// Avro schema (.avsc) or container file (.avro) → generic schema
    Reverse(ReverseArgs),
    /// Check an Avro schema and print diagnostics
    Validate(ValidateArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ForwardArgs {
    /// Path to the generic schema
    #[arg(value_name = "SCHEMA")]
    input: PathBuf,

    /// Write the Avro schema here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Record name
    #[arg(long)]
    name: Option<String>,

    /// Record namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Document with shared `definitions`
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long, default_value_t = false)]
    minify: bool,

    /// Wrap the schema in a Schema Registry envelope
    #[arg(long, default_value_t = false)]
    schema_registry: bool,

    /// Make optional multi-type fields nullable
    #[arg(long, default_value_t = false)]
    null_defaults: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ReverseArgs {
    /// Path to an .avsc or .avro file
    #[arg(value_name = "AVRO")]
    input: PathBuf,

    /// Write the generic schema here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Path to the Avro schema
    #[arg(value_name = "AVSC")]
    input: PathBuf,
}

#[cfg(feature = "cli")]
fn read(path: &Path) -> avrobridge::Result<String> {
    std::fs::read_to_string(path).map_err(|source| avrobridge::ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "cli")]
fn emit(text: &str, output: Option<&Path>) -> avrobridge::Result<()> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|source| avrobridge::ConversionError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

#[cfg(feature = "cli")]
fn forward(args: &ForwardArgs) -> avrobridge::Result<()> {
    use avrobridge::config::{
        AdditionalOption, ContainerData, EntityData, ForwardRequest, RequestOptions,
        TargetScriptOptions,
    };

    let schema = read(&args.input)?;
    let model_definitions = args.definitions.as_deref().map(read).transpose()?;
    let mut additional_options = vec![AdditionalOption {
        id: "minify".to_string(),
        value: args.minify.into(),
    }];
    if args.null_defaults {
        additional_options.push(AdditionalOption {
            id: "addNullDefaults".to_string(),
            value: true.into(),
        });
    }

    let request = ForwardRequest {
        entity_data: EntityData {
            name: args.name.clone(),
            ..Default::default()
        },
        // The schema's own `definitions` act as the internal layer.
        internal_definitions: Some(schema.clone()),
        json_schema: schema,
        container_data: Some(ContainerData {
            name: args.namespace.clone(),
        }),
        external_definitions: None,
        model_definitions,
        options: Some(RequestOptions {
            additional_options,
            target_script_options: args.schema_registry.then(|| TargetScriptOptions {
                keyword: Some("schemaRegistry".to_string()),
            }),
        }),
    };
    let script = avrobridge::forward::generate_script(&request)?;
    emit(&script, args.output.as_deref())
}

#[cfg(feature = "cli")]
fn reverse(args: &ReverseArgs) -> avrobridge::Result<()> {
    use avrobridge::reverse::{reverse_from_file, AvroContainerDecoder};

    let output = reverse_from_file(&args.input, &AvroContainerDecoder)?;
    if let Some(container) = &output.container_name {
        tracing::info!(container = container.as_str(), "schema namespace");
    }
    emit(&output.json_schema, args.output.as_deref())
}

#[cfg(feature = "cli")]
fn validate(args: &ValidateArgs) -> avrobridge::Result<bool> {
    use avrobridge::validation::{validate, DiagnosticKind};

    let text = read(&args.input)?;
    let diagnostics = validate(&text);
    let rendered = serde_json::to_value(&diagnostics)
        .map_err(|e| avrobridge::ConversionError::Structural(e.to_string()))?;
    emit(&avrobridge::forward::postprocess::to_pretty_string(&rendered)?, None)?;
    Ok(diagnostics
        .iter()
        .all(|diagnostic| diagnostic.kind == DiagnosticKind::Success))
}

#[cfg(feature = "cli")]
fn main() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Forward(args) => forward(args).map(|()| true),
        Command::Reverse(args) => reverse(args).map(|()| true),
        Command::Validate(args) => validate(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary is only available with the `cli` feature enabled.");
    std::process::exit(1);
}
