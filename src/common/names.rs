use once_cell::sync::Lazy;
use regex::Regex;

static INVALID_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());
static VALID_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Placeholder given to complex fields that arrive without a name.
pub const DEFAULT_NAME: &str = "New_field";

/// Convert a raw string into a valid Avro name.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, and so does a
/// leading digit. Applying it twice is the same as applying it once.
pub fn avro_name(name: &str) -> String {
    let mut val = INVALID_NAME_CHARS.replace_all(name, "_").into_owned();
    if val.starts_with(|c: char| c.is_ascii_digit()) {
        val.replace_range(..1, "_");
    }
    if val.is_empty() {
        val.push('_');
    }
    val
}

pub fn is_valid_avro_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Convert an input string into a valid Avro namespace.
///
/// Each dot-separated segment is sanitized like a name; empty segments
/// are dropped.
pub fn avro_namespace(namespace: &str) -> String {
    namespace
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(avro_name)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split `com.acme.Person` into `(Some("com.acme"), "Person")`.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((namespace, local)) if !namespace.is_empty() => (Some(namespace), local),
        Some((_, local)) => (None, local),
        None => (None, name),
    }
}

/// Build the full name of a named type from its parts.
pub fn fullname(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

/// Hands out `New_field`, `New_field_1`, `New_field_2`, ...
///
/// One generator lives in each conversion context, so numbering restarts
/// with every top-level call.
#[derive(Debug, Default, Clone)]
pub struct NameGenerator {
    index: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self) -> String {
        let name = if self.index == 0 {
            DEFAULT_NAME.to_string()
        } else {
            format!("{DEFAULT_NAME}_{}", self.index)
        };
        self.index += 1;
        name
    }
}
