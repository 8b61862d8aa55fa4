//! Error types shared by both conversion directions.

use serde::Serialize;
use std::error::Error as _;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Everything that can abort a conversion call.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Invalid JSON in {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::Structural(_) => "StructuralError",
            Self::Decode(_) => "DecodeError",
            Self::Io { .. } => "IoError",
        }
    }

    /// Flatten the error into an owned, serializable report.
    pub fn to_report(&self) -> ErrorReport {
        let mut causes = Vec::new();
        let mut source = self.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
            causes,
        }
    }
}

impl From<apache_avro::Error> for ConversionError {
    fn from(err: apache_avro::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Plain-data view of a [`ConversionError`].
///
/// Holds no references to the native error, so it can be serialized and
/// handed across a process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl From<&ConversionError> for ErrorReport {
    fn from(err: &ConversionError) -> Self {
        err.to_report()
    }
}
