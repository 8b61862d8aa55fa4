//! Type vocabulary of both schema dialects.
//!
//! Type tokens arrive as strings in both directions; they are parsed once
//! into these enums so every dispatch site is an exhaustive `match`.

use std::fmt;

/// The thirteen Avro type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvroKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Fixed,
}

impl AvroKind {
    pub const ALL: [AvroKind; 13] = [
        AvroKind::Null,
        AvroKind::Boolean,
        AvroKind::Int,
        AvroKind::Long,
        AvroKind::Float,
        AvroKind::Double,
        AvroKind::Bytes,
        AvroKind::String,
        AvroKind::Record,
        AvroKind::Enum,
        AvroKind::Array,
        AvroKind::Map,
        AvroKind::Fixed,
    ];

    /// Parse an Avro type token. Named-type references return `None`.
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "bytes" => Self::Bytes,
            "string" => Self::String,
            "record" => Self::Record,
            "enum" => Self::Enum,
            "array" => Self::Array,
            "map" => Self::Map,
            "fixed" => Self::Fixed,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Record => "record",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Map => "map",
            Self::Fixed => "fixed",
        }
    }

    /// Record, array, fixed, enum and map.
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Self::Record | Self::Array | Self::Fixed | Self::Enum | Self::Map
        )
    }

    /// Types that carry a name and must be defined exactly once.
    pub fn is_named(self) -> bool {
        matches!(self, Self::Record | Self::Enum | Self::Fixed)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Float | Self::Double)
    }

    pub fn is_primitive(self) -> bool {
        !self.is_complex()
    }

    /// Whether `logical_type` may annotate this kind.
    pub fn allows_logical_type(self, logical_type: &str) -> bool {
        let allowed: &[&str] = match self {
            Self::Int => &["date", "time-millis"],
            Self::Long => &["time-micros", "timestamp-millis", "timestamp-micros"],
            Self::Bytes => &["decimal"],
            Self::Fixed => &["decimal", "duration"],
            _ => &[],
        };
        allowed.contains(&logical_type)
    }
}

impl fmt::Display for AvroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tokens of the generic (JSON-Schema-flavoured) model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericKind {
    /// Tokens shared verbatim with Avro (`string`, `record`, `fixed`, ...).
    Avro(AvroKind),
    /// `number`; the concrete Avro kind comes from the `mode` attribute.
    Number,
    /// A `type: "choice"` node holding union alternatives in `items`.
    Choice,
    /// Anything else: a user-defined type name or an unsupported token.
    Unknown(String),
}

impl GenericKind {
    pub fn parse(token: &str) -> Self {
        match token {
            "number" | "integer" => Self::Number,
            "object" => Self::Avro(AvroKind::Record),
            "choice" => Self::Choice,
            other => match AvroKind::parse(other) {
                Some(kind) => Self::Avro(kind),
                None => Self::Unknown(other.to_string()),
            },
        }
    }
}

/// Numeric `mode` attribute of a generic `number` node.
pub fn numeric_kind(mode: Option<&str>) -> AvroKind {
    match mode {
        Some("long") => AvroKind::Long,
        Some("float") => AvroKind::Float,
        Some("double") => AvroKind::Double,
        _ => AvroKind::Int,
    }
}

/// Java-interop meta property keys and the generic attribute that holds
/// each key's value inside a `metaProps` entry.
pub const META_PROPERTIES: [(&str, &str); 5] = [
    ("avro.java.string", "metaValueString"),
    ("java-element", "metaValueElement"),
    ("java-element-class", "metaValueElementClass"),
    ("java-class", "metaValueClass"),
    ("java-key-class", "metaValueKeyClass"),
];

pub fn is_meta_property(key: &str) -> bool {
    META_PROPERTIES.iter().any(|(k, _)| *k == key)
}

pub fn meta_value_field(key: &str) -> Option<&'static str> {
    META_PROPERTIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, field)| *field)
}

pub const DEFAULT_TYPE: &str = "string";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_token() {
        for kind in AvroKind::ALL {
            assert_eq!(AvroKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AvroKind::parse("Address"), None);
    }

    #[test]
    fn logical_type_allow_list() {
        assert!(AvroKind::Int.allows_logical_type("date"));
        assert!(AvroKind::Long.allows_logical_type("timestamp-micros"));
        assert!(AvroKind::Fixed.allows_logical_type("duration"));
        assert!(!AvroKind::Int.allows_logical_type("timestamp-millis"));
        assert!(!AvroKind::String.allows_logical_type("decimal"));
    }

    #[test]
    fn generic_tokens() {
        assert_eq!(GenericKind::parse("number"), GenericKind::Number);
        assert_eq!(GenericKind::parse("object"), GenericKind::Avro(AvroKind::Record));
        assert_eq!(
            GenericKind::parse("Address"),
            GenericKind::Unknown("Address".into())
        );
        assert_eq!(numeric_kind(None), AvroKind::Int);
        assert_eq!(numeric_kind(Some("double")), AvroKind::Double);
    }
}
