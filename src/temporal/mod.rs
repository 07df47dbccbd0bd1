//! Temporal normalization (`spec.md` §4.9).
//!
//! Every field the registry marks temporal (declared `date`-typed, or
//! named `*_date`) is rewritten to `YYYY-MM-DD` via the function
//! registry's `format_date_iso` transform, then an optional chronological
//! timeline can be built from the normalized result.

use crate::model::FinalResult;
use crate::registry::{DomainRegistry, FunctionRegistry};
use crate::value::FieldValue;
use std::collections::HashMap;

/// One entry in a built timeline: a temporal field and its ISO date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Field name the date came from.
    pub field: String,
    /// `YYYY-MM-DD` date string.
    pub date: String,
}

/// Rewrites every temporal field's value to `YYYY-MM-DD` in place.
/// Values that do not parse as a recognized date are left unchanged.
///
/// Operates on a bare field-value map so it can run either on a single
/// chunk's merged result (before cross-chunk merge) or on the final
/// result, per the same rule.
pub fn normalize_dates(
    field_values: &mut HashMap<String, FieldValue>,
    registry: &DomainRegistry,
    domain: &str,
    functions: &FunctionRegistry,
) {
    for (field_name, value) in field_values.iter_mut() {
        let Some((_, field)) = registry.get_field(domain, field_name) else {
            continue;
        };
        if !field.is_temporal() {
            continue;
        }
        if let Ok(normalized) = functions.call_transform("format_date_iso", value) {
            *value = normalized;
        }
    }
}

/// Builds a chronologically-sorted timeline of every temporal field that
/// normalized to a valid ISO date.
#[must_use]
pub fn build_timeline(result: &FinalResult, registry: &DomainRegistry, domain: &str) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = result
        .field_values
        .iter()
        .filter_map(|(field_name, value)| {
            let (_, field) = registry.get_field(domain, field_name)?;
            if !field.is_temporal() {
                return None;
            }
            let date = value.as_str()?;
            is_iso_date(date).then(|| TimelineEntry {
                field: field_name.clone(),
                date: date.to_string(),
            })
        })
        .collect();

    entries.sort_by(|a, b| a.date.cmp(&b.date));
    entries
}

fn is_iso_date(s: &str) -> bool {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
