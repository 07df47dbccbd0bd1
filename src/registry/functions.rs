//! Named formatters, validators and post-processors referenced by schema.
//!
//! Field definitions reference functions by string id rather than by
//! closure directly, so domain definitions stay `Clone`-able and so
//! function ids can be validated at registration time (`spec.md` §3,
//! `FieldDefinition` invariant).

use crate::error::{Result, SchemaError};
use crate::value::FieldValue;
use std::collections::HashMap;
use std::sync::Arc;

/// A formatter or post-processor: takes a raw value, returns a transformed one.
pub type TransformFn = Arc<dyn Fn(&FieldValue) -> FieldValue + Send + Sync>;

/// A validator: takes a formatted value, returns whether it is acceptable.
pub type ValidateFn = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

/// Registry of named transform/validate functions.
///
/// Seeded at construction with the default identity/date/validation
/// implementations named in `spec.md` §4.6. Lifecycle mirrors
/// [`crate::registry::DomainRegistry`]: populate during setup, then treat
/// as read-only.
#[derive(Clone)]
pub struct FunctionRegistry {
    transforms: HashMap<String, TransformFn>,
    validators: HashMap<String, ValidateFn>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Creates a registry seeded with the default functions.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
            validators: HashMap::new(),
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register_transform("format_date_iso", Arc::new(format_date_iso));
        self.register_transform("format_date_us", Arc::new(format_date_us));
        self.register_transform("format_date_eu", Arc::new(format_date_eu));
        self.register_transform("normalize_whitespace", Arc::new(normalize_whitespace));
        self.register_transform("capitalize_names", Arc::new(capitalize_names));
        self.register_transform("extract_numbers", Arc::new(extract_numbers));

        self.register_validator("validate_date", Arc::new(validate_date));
        self.register_validator("validate_email", Arc::new(validate_email));
        self.register_validator("validate_phone", Arc::new(validate_phone));
    }

    /// Registers a transform function under `id`. Idempotent; a later
    /// registration under the same id overwrites the earlier one.
    pub fn register_transform(&mut self, id: impl Into<String>, f: TransformFn) {
        self.transforms.insert(id.into(), f);
    }

    /// Registers a validator function under `id`.
    pub fn register_validator(&mut self, id: impl Into<String>, f: ValidateFn) {
        self.validators.insert(id.into(), f);
    }

    /// Returns `true` if a transform function id is registered.
    #[must_use]
    pub fn has_transform(&self, id: &str) -> bool {
        self.transforms.contains_key(id)
    }

    /// Returns `true` if a validator function id is registered.
    #[must_use]
    pub fn has_validator(&self, id: &str) -> bool {
        self.validators.contains_key(id)
    }

    /// Calls a transform function by id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownFunction`] if `id` is not registered.
    pub fn call_transform(&self, id: &str, value: &FieldValue) -> Result<FieldValue> {
        let f = self
            .transforms
            .get(id)
            .ok_or_else(|| SchemaError::UnknownFunction { id: id.to_string() })?;
        Ok(f(value))
    }

    /// Calls a validator function by id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownFunction`] if `id` is not registered.
    pub fn call_validator(&self, id: &str, value: &FieldValue) -> Result<bool> {
        let f = self
            .validators
            .get(id)
            .ok_or_else(|| SchemaError::UnknownFunction { id: id.to_string() })?;
        Ok(f(value))
    }
}

/// Tries each accepted input date format in turn, returning the first match.
fn parse_any_date(text: &str) -> Option<chrono::NaiveDate> {
    use chrono::NaiveDate;

    let formats = [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
}

fn format_date_iso(value: &FieldValue) -> FieldValue {
    match value.as_str().and_then(parse_any_date) {
        Some(date) => FieldValue::String(date.format("%Y-%m-%d").to_string()),
        None => value.clone(),
    }
}

fn format_date_us(value: &FieldValue) -> FieldValue {
    match value.as_str().and_then(parse_any_date) {
        Some(date) => FieldValue::String(date.format("%m/%d/%Y").to_string()),
        None => value.clone(),
    }
}

fn format_date_eu(value: &FieldValue) -> FieldValue {
    match value.as_str().and_then(parse_any_date) {
        Some(date) => FieldValue::String(date.format("%d/%m/%Y").to_string()),
        None => value.clone(),
    }
}

fn validate_date(value: &FieldValue) -> bool {
    value.as_str().is_some_and(|s| parse_any_date(s).is_some())
}

fn validate_email(value: &FieldValue) -> bool {
    value.as_str().is_some_and(|s| {
        let Some((local, domain)) = s.split_once('@') else {
            return false;
        };
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}

fn validate_phone(value: &FieldValue) -> bool {
    value.as_str().is_some_and(|s| {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        (7..=15).contains(&digits.len())
    })
}

fn normalize_whitespace(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::String(s) => FieldValue::String(s.split_whitespace().collect::<Vec<_>>().join(" ")),
        other => other.clone(),
    }
}

/// Capitalizes each whitespace-separated token, preserving hyphenated
/// sub-tokens and the `Mc`/`Mac` surname prefixes (`spec.md` §4.6).
fn capitalize_names(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::String(s) => {
            let capitalized = s
                .split_whitespace()
                .map(capitalize_token)
                .collect::<Vec<_>>()
                .join(" ");
            FieldValue::String(capitalized)
        }
        other => other.clone(),
    }
}

fn capitalize_token(token: &str) -> String {
    token
        .split('-')
        .map(capitalize_subtoken)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize_subtoken(sub: &str) -> String {
    for prefix in ["Mc", "Mac"] {
        if sub.len() > prefix.len() && sub[..prefix.len()].eq_ignore_ascii_case(prefix) {
            let rest = &sub[prefix.len()..];
            return format!("{prefix}{}", capitalize_plain(rest));
        }
    }
    capitalize_plain(sub)
}

fn capitalize_plain(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn extract_numbers(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::String(s) => {
            let numbers: Vec<FieldValue> = s
                .split(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
                .filter(|tok| !tok.is_empty())
                .filter_map(|tok| tok.parse::<f64>().ok())
                .map(FieldValue::Number)
                .collect();
            FieldValue::List(numbers)
        }
        other => other.clone(),
    }
}
