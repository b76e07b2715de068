//! Typed scalar property values shared by every source format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::parser::coerce;

/// Property map of a node or relationship.
///
/// Ordered by key so serialized output is stable across runs.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A typed scalar property value.
///
/// `Null` is the explicit absence marker used when a numeric field is
/// blank or cannot be coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl PropertyValue {
    /// Canonical text form used to compare values during reference resolution.
    ///
    /// Returns `None` for `Null`, which never matches anything.
    pub fn index_key(&self) -> Option<String> {
        match self {
            PropertyValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Returns the string content if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Converts a JSON property from a path/record export.
    ///
    /// Strings go through the same coercion as script and tabular values.
    /// Neo4j split integers (`{"low": .., "high": ..}`) are recombined.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => PropertyValue::Null,
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Integer(i)
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite())
                        .map(PropertyValue::Float)
                        .unwrap_or_else(|| PropertyValue::String(n.to_string()))
                }
            }
            JsonValue::String(s) => coerce(s),
            JsonValue::Object(map) => match (map.get("low"), map.get("high"), map.len()) {
                (Some(low), Some(high), 2) => match (low.as_i64(), high.as_i64()) {
                    (Some(low), Some(high)) => PropertyValue::Integer(join_split_integer(low, high)),
                    _ => PropertyValue::String(value.to_string()),
                },
                _ => PropertyValue::String(value.to_string()),
            },
            JsonValue::Bool(_) | JsonValue::Array(_) => PropertyValue::String(value.to_string()),
        }
    }
}

/// Recombines a 64-bit integer split into 32-bit halves.
pub(crate) fn join_split_integer(low: i64, high: i64) -> i64 {
    (high << 32) | (low & 0xFFFF_FFFF)
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}
