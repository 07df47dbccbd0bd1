//! Polymorphic field value representation.
//!
//! Extracted field values are heterogeneous — scalar, list, or nested
//! object — so the merger and formatter dispatch on a tagged variant
//! rather than a concrete Rust type per field.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// The declared type of a field, independent of the value actually
/// produced for it (a field may be `date`-typed but extracted as `null`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    String,
    /// Numeric value.
    Number,
    /// Calendar date, normalized to `YYYY-MM-DD`.
    Date,
    /// Multi-valued field.
    List,
    /// Nested structure.
    Object,
    /// Boolean flag.
    Bool,
}

/// A single extracted field value.
///
/// Ordering of variants matters for `PartialEq`-based dedup: two values
/// compare equal only when both tag and content match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Numeric value, stored as `f64` regardless of source precision.
    Number(f64),
    /// Text value.
    String(String),
    /// Ordered list of values.
    List(Vec<FieldValue>),
    /// Nested map of field name to value, insertion order preserved via `BTreeMap`
    /// for deterministic serialization.
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns `true` when this value is [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the value as a list slice, if it is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the value as an object map, if it is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` if the value represents an empty string, empty list,
    /// or empty object (used by the null filter's emptiness checks).
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Object(map) => map.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Returns `true` if this is a numeric zero (used by the null filter's
    /// optional `strip_zeros` behavior).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Number(n) if *n == 0.0)
    }

    /// Converts a `serde_json::Value` into a [`FieldValue`].
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts this value into a `serde_json::Value` for serialization
    /// at the formatter boundary.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Self::String(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => {
                Json::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Renders the value as a single display string, used by the flat-text
    /// and tagged-markup formatters for scalar leaves.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Self::String(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::display_string)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Object(map) => map
                .iter()
                .map(|(k, v)| format!("{k}: {}", v.display_string()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(FieldValue::Null.is_null());
        assert!(!FieldValue::Bool(false).is_null());
    }

    #[test]
    fn test_is_empty_value() {
        assert!(FieldValue::String(String::new()).is_empty_value());
        assert!(FieldValue::List(vec![]).is_empty_value());
        assert!(!FieldValue::Number(0.0).is_empty_value());
        assert!(FieldValue::Null.is_empty_value());
    }

    #[test]
    fn test_is_zero() {
        assert!(FieldValue::Number(0.0).is_zero());
        assert!(!FieldValue::Number(1.0).is_zero());
        assert!(!FieldValue::String("0".to_string()).is_zero());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = serde_json::json!({"a": 1, "b": ["x", "y"], "c": null});
        let value = FieldValue::from_json(&json);
        let back = value.to_json();
        assert_eq!(json, back);
    }

    #[test]
    fn test_display_string_list() {
        let value = FieldValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(value.display_string(), "a, b");
    }

    #[test]
    fn test_display_string_number_integer() {
        let value = FieldValue::Number(42.0);
        assert_eq!(value.display_string(), "42");
    }

    #[test]
    fn test_as_str_and_list() {
        let value = FieldValue::String("hi".to_string());
        assert_eq!(value.as_str(), Some("hi"));
        assert!(value.as_list().is_none());

        let list = FieldValue::List(vec![FieldValue::Number(1.0)]);
        assert_eq!(list.as_list().unwrap().len(), 1);
    }
}
