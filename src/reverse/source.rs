//! Reading schema text from `.avsc` and `.avro` files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use apache_avro::Reader;
use tracing::debug;

use crate::error::{ConversionError, Result};

/// Pulls the writer schema out of an Avro object container file.
pub trait ContainerDecoder {
    fn writer_schema(&self, path: &Path) -> Result<String>;
}

/// [`ContainerDecoder`] backed by `apache-avro`; handles the `null`,
/// `deflate` and `snappy` block codecs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvroContainerDecoder;

impl ContainerDecoder for AvroContainerDecoder {
    fn writer_schema(&self, path: &Path) -> Result<String> {
        let file = File::open(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = Reader::new(BufReader::new(file))?;
        serde_json::to_string(reader.writer_schema())
            .map_err(|e| ConversionError::Decode(format!("cannot serialize writer schema: {e}")))
    }
}

/// Schema text and file extension of a reverse-engineering source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    pub text: String,
    pub extension: String,
}

/// Read schema text, choosing the strategy by file extension.
pub fn read_schema_source(path: &Path, decoder: &dyn ContainerDecoder) -> Result<SchemaSource> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let text = match extension.as_str() {
        "avsc" => std::fs::read_to_string(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })?,
        "avro" => decoder.writer_schema(path)?,
        _ => {
            return Err(ConversionError::Decode(format!(
                "The file {} is not recognized as Avro Schema or Data.",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), extension = extension.as_str(), "read schema source");
    Ok(SchemaSource { text, extension })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FixedDecoder;

    impl ContainerDecoder for FixedDecoder {
        fn writer_schema(&self, _path: &Path) -> Result<String> {
            Ok(r#"{"type": "record", "name": "Fixed", "fields": []}"#.to_string())
        }
    }

    #[test]
    fn avsc_is_read_as_text() {
        let mut file = tempfile::Builder::new().suffix(".avsc").tempfile().unwrap();
        write!(file, r#"{{"type": "string"}}"#).unwrap();
        let source = read_schema_source(file.path(), &FixedDecoder).unwrap();
        assert_eq!(source.text, r#"{"type": "string"}"#);
        assert_eq!(source.extension, "avsc");
    }

    #[test]
    fn avro_goes_through_the_decoder() {
        let file = tempfile::Builder::new().suffix(".avro").tempfile().unwrap();
        let source = read_schema_source(file.path(), &FixedDecoder).unwrap();
        assert!(source.text.contains("Fixed"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_schema_source(Path::new("schema.json"), &FixedDecoder).unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
        assert!(err.to_string().contains("not recognized as Avro Schema or Data"));
    }

    #[test]
    fn missing_avsc_is_an_io_error() {
        let err = read_schema_source(Path::new("/nonexistent/x.avsc"), &FixedDecoder).unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }
}
