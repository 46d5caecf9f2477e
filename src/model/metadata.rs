//! Metadata values attached to nouns and verbs.
//!
//! Metadata is an opaque, JSON-compatible mapping keyed by entity id. The one
//! recognized field is `noun`, the noun-type tag; everything else is
//! user-defined. Values are typed (rather than a raw `serde_json::Value`) so
//! the filter module can short-circuit on type mismatches instead of
//! re-parsing JSON on every comparison.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Field name recognized by the system: the noun-type tag.
pub const NOUN_TYPE_FIELD: &str = "noun";

/// Supported metadata value types.
///
/// Serializes using an adjacently-tagged representation so values round-trip
/// through JSON without losing their type:
///
/// ```json
/// {"type": "string", "value": "hello"}
/// {"type": "integer", "value": 42}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    /// UTF-8 string value.
    String(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Array of strings (tags, categories).
    StringArray(Vec<String>),
}

impl MetadataValue {
    /// Returns the value as a string slice, if it is a `String`.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is an `Integer`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// True if this is a `String` variant.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::StringArray(arr) => write!(f, "[{}]", arr.join(", ")),
        }
    }
}

/// Opaque, JSON-compatible metadata map.
pub type Metadata = HashMap<String, MetadataValue>;

/// Reads the recognized `noun` field (the noun-type tag) out of a metadata
/// map, if present.
#[must_use]
pub fn noun_type(metadata: &Metadata) -> Option<&str> {
    metadata.get(NOUN_TYPE_FIELD).and_then(MetadataValue::as_string)
}
