//! Null Filter (`spec.md` §4.10).
//!
//! Drops keys whose value is null, a recognized "not available" string,
//! an empty string, or (optionally) zero, recursively through maps and
//! lists. A map that becomes empty after filtering is itself removed
//! unless its key is in `preserve_fields`.

use crate::value::FieldValue;
use std::collections::{BTreeMap, HashMap};

/// Case-insensitive set of strings treated as absent values.
const NA_STRINGS: &[&str] = &[
    "n/a",
    "na",
    "not available",
    "not applicable",
    "unknown",
];

/// Controls how aggressively the null filter removes values.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Keys prefixed with `_` survive filtering even if their value would
    /// otherwise be dropped.
    pub preserve_metadata: bool,
    /// Field names that survive even if their filtered value is empty.
    pub preserve_fields: Vec<String>,
    /// Also drop numeric zero values.
    pub strip_zeros: bool,
}

/// Filters a field-name → value map in place, dropping absent values.
#[must_use]
pub fn filter(fields: &HashMap<String, FieldValue>, opts: &FilterOptions) -> HashMap<String, FieldValue> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            if opts.preserve_metadata && key.starts_with('_') {
                return Some((key.clone(), value.clone()));
            }
            let filtered = filter_value(value, opts);
            match filtered {
                Some(v) => Some((key.clone(), v)),
                None if opts.preserve_fields.iter().any(|f| f == key) => Some((key.clone(), FieldValue::Null)),
                None => None,
            }
        })
        .collect()
}

/// Returns `None` if `value` (after recursive filtering) counts as absent.
fn filter_value(value: &FieldValue, opts: &FilterOptions) -> Option<FieldValue> {
    match value {
        FieldValue::Null => None,
        FieldValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || NA_STRINGS.contains(&trimmed.to_lowercase().as_str()) {
                None
            } else {
                Some(value.clone())
            }
        }
        FieldValue::Number(_) => {
            if opts.strip_zeros && value.is_zero() {
                None
            } else {
                Some(value.clone())
            }
        }
        FieldValue::List(items) => {
            let filtered: Vec<FieldValue> = items.iter().filter_map(|v| filter_value(v, opts)).collect();
            if filtered.is_empty() { None } else { Some(FieldValue::List(filtered)) }
        }
        FieldValue::Object(map) => {
            let filtered: BTreeMap<String, FieldValue> = map
                .iter()
                .filter_map(|(k, v)| {
                    if opts.preserve_metadata && k.starts_with('_') {
                        return Some((k.clone(), v.clone()));
                    }
                    filter_value(v, opts).map(|fv| (k.clone(), fv))
                })
                .collect();
            if filtered.is_empty() { None } else { Some(FieldValue::Object(filtered)) }
        }
        FieldValue::Bool(_) => Some(value.clone()),
    }
}
