//! Domain/field registry and schema model.
//!
//! Holds the domain → sub-domain → field tree that drives prompt
//! synthesis, merging and validation. The registry is populated once at
//! startup (idempotent registration; last-writer-wins) and is read-only
//! for the remainder of the process, so concurrent readers never
//! synchronize.

pub mod domains;
pub mod functions;

use crate::error::{Result, SchemaError};
use crate::value::FieldType;
use std::collections::HashMap;

pub use functions::FunctionRegistry;

/// Severity level for a field's validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationLevel {
    /// Informational only.
    Info,
    /// Surfaced but non-blocking.
    #[default]
    Warning,
    /// Treated as a hard failure by callers that choose to enforce it.
    Error,
}

/// Atomic extractable value declared within a sub-domain.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Name, unique within its sub-domain.
    pub name: String,
    /// Human-readable description rendered into prompts.
    pub description: String,
    /// Declared value type.
    pub field_type: FieldType,
    /// Whether the field must be present for the extraction to be
    /// considered complete (informational; the engine does not fail
    /// extractions over missing required fields).
    pub required: bool,
    /// Whether the cross-chunk merge should collapse this field's values
    /// into a single scalar (see `merge` module).
    pub unique: bool,
    /// Example values rendered in the prompt.
    pub examples: Vec<String>,
    /// Free-form extraction guidance specific to this field.
    pub extraction_instructions: Option<String>,
    /// Keywords that often appear near this field in source text.
    pub keywords: Vec<String>,
    /// Keywords suggesting the field is absent.
    pub negative_keywords: Vec<String>,
    /// Higher values are rendered earlier in the prompt.
    pub extraction_priority: i32,
    /// Minimum confidence to accept a produced value.
    pub confidence_threshold: f32,
    /// Optional regex the formatted value must match.
    pub formatting_pattern: Option<String>,
    /// Function-registry id used to format the raw value.
    pub format_function_id: Option<String>,
    /// Function-registry id used to validate the formatted value.
    pub validation_function_id: Option<String>,
    /// Function-registry id applied after formatting and validation.
    pub post_process_function_id: Option<String>,
    /// Names of fields this one is commonly extracted alongside.
    pub related_fields: Vec<String>,
    /// Severity assigned to this field's validation failures.
    pub validation_level: ValidationLevel,
}

impl FieldDefinition {
    /// Creates a field definition with the given name, description and type.
    /// All optional attributes default to empty/disabled.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_type,
            required: false,
            unique: false,
            examples: Vec::new(),
            extraction_instructions: None,
            keywords: Vec::new(),
            negative_keywords: Vec::new(),
            extraction_priority: 0,
            confidence_threshold: 0.0,
            formatting_pattern: None,
            format_function_id: None,
            validation_function_id: None,
            post_process_function_id: None,
            related_fields: Vec::new(),
            validation_level: ValidationLevel::Warning,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Marks the field as unique (see merge policy §4.8).
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets example values.
    #[must_use]
    pub fn examples(mut self, examples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Sets free-form extraction guidance.
    #[must_use]
    pub fn extraction_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.extraction_instructions = Some(instructions.into());
        self
    }

    /// Sets keywords used by the domain identifier's field scoring.
    #[must_use]
    pub fn keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Sets extraction priority (higher renders first in the prompt).
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.extraction_priority = priority;
        self
    }

    /// Sets the formatter function id.
    #[must_use]
    pub fn format_function(mut self, id: impl Into<String>) -> Self {
        self.format_function_id = Some(id.into());
        self
    }

    /// Sets the post-process function id.
    #[must_use]
    pub fn post_process_function(mut self, id: impl Into<String>) -> Self {
        self.post_process_function_id = Some(id.into());
        self
    }

    /// Returns `true` if the field's name or any alias ends with `_date`,
    /// which the temporal normalizer treats specially (§4.9).
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        self.field_type == FieldType::Date || self.name.ends_with("_date")
    }
}

/// A focused group of fields within a domain.
#[derive(Debug, Clone)]
pub struct SubDomainDefinition {
    /// Name, unique within its domain.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Fields declared in this sub-domain, field names unique within it.
    pub fields: Vec<FieldDefinition>,
    /// Free-form instructions rendered ahead of this sub-domain's fields.
    pub extraction_instructions: Option<String>,
    /// Rendering/selection priority relative to sibling sub-domains.
    pub priority: i32,
    /// Anti-hallucination guidance specific to this sub-domain.
    pub anti_hallucination_instructions: Option<String>,
}

impl SubDomainDefinition {
    /// Creates a sub-domain definition with the given fields.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if two fields share a name.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self> {
        let name = name.into();
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    sub_domain: name,
                    field: field.name.clone(),
                }
                .into());
            }
        }
        Ok(Self {
            name,
            description: description.into(),
            fields,
            extraction_instructions: None,
            priority: 0,
            anti_hallucination_instructions: None,
        })
    }

    /// Sets free-form extraction instructions for the whole sub-domain.
    #[must_use]
    pub fn extraction_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.extraction_instructions = Some(instructions.into());
        self
    }

    /// Sets the sub-domain's selection/rendering priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets sub-domain-specific anti-hallucination guidance.
    #[must_use]
    pub fn anti_hallucination_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.anti_hallucination_instructions = Some(instructions.into());
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns fields ordered by `extraction_priority` descending, ties
    /// broken by declaration order (§4.2).
    #[must_use]
    pub fn fields_by_priority(&self) -> Vec<&FieldDefinition> {
        let mut ordered: Vec<&FieldDefinition> = self.fields.iter().collect();
        ordered.sort_by(|a, b| b.extraction_priority.cmp(&a.extraction_priority));
        ordered
    }
}

/// A top-level schema grouping related sub-domains.
#[derive(Debug, Clone)]
pub struct DomainDefinition {
    /// Name, unique within the registry.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Sub-domains declared under this domain.
    pub sub_domains: Vec<SubDomainDefinition>,
    /// Free-form instructions rendered in the prompt's domain header.
    pub extraction_instructions: Option<String>,
    /// Anti-hallucination guidance shared by all sub-domains.
    pub anti_hallucination_instructions: Option<String>,
    /// Keywords used by the domain identifier's domain scoring.
    pub keywords: Vec<String>,
    /// Minimum composite confidence to retain this domain as a candidate.
    pub confidence_threshold: f32,
}

impl DomainDefinition {
    /// Creates a domain definition with the given sub-domains.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_domains: Vec<SubDomainDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sub_domains,
            extraction_instructions: None,
            anti_hallucination_instructions: None,
            keywords: Vec::new(),
            confidence_threshold: 0.6,
        }
    }

    /// Sets free-form extraction instructions for the whole domain.
    #[must_use]
    pub fn extraction_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.extraction_instructions = Some(instructions.into());
        self
    }

    /// Sets domain-wide anti-hallucination guidance.
    #[must_use]
    pub fn anti_hallucination_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.anti_hallucination_instructions = Some(instructions.into());
        self
    }

    /// Sets keywords used by the domain identifier.
    #[must_use]
    pub fn keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up a sub-domain by name.
    #[must_use]
    pub fn sub_domain(&self, name: &str) -> Option<&SubDomainDefinition> {
        self.sub_domains.iter().find(|s| s.name == name)
    }

    /// Iterates over every field declared anywhere in this domain, paired
    /// with the sub-domain that declares it.
    pub fn all_fields(&self) -> impl Iterator<Item = (&SubDomainDefinition, &FieldDefinition)> {
        self.sub_domains
            .iter()
            .flat_map(|sd| sd.fields.iter().map(move |f| (sd, f)))
    }
}

/// Process-wide catalog of domain schemas.
///
/// Lifecycle: `init` → `populate` (idempotent `register`) → read-only.
/// After population, lookups never mutate state and are safe to call
/// concurrently from any number of readers.
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    domains: HashMap<String, DomainDefinition>,
    /// Registration order, used as the identifier's tie-break.
    order: Vec<String>,
}

impl DomainRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a domain. Re-registering a name overwrites the previous
    /// definition (last-writer-wins, by design — see `spec.md` §4.1) but
    /// keeps its original registration-order position.
    pub fn register(&mut self, domain: DomainDefinition) {
        if !self.domains.contains_key(&domain.name) {
            self.order.push(domain.name.clone());
        }
        self.domains.insert(domain.name.clone(), domain);
    }

    /// Looks up a domain by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DomainDefinition> {
        self.domains.get(name)
    }

    /// Looks up a sub-domain by (domain, sub-domain) name.
    #[must_use]
    pub fn get_sub_domain(&self, domain: &str, sub_domain: &str) -> Option<&SubDomainDefinition> {
        self.get(domain).and_then(|d| d.sub_domain(sub_domain))
    }

    /// Looks up a field by (domain, field) name, searching all sub-domains.
    #[must_use]
    pub fn get_field(&self, domain: &str, field: &str) -> Option<(&SubDomainDefinition, &FieldDefinition)> {
        self.get(domain)?
            .all_fields()
            .find(|(_, f)| f.name == field)
    }

    /// Lists all registered domains in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&DomainDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.domains.get(name))
            .collect()
    }

    /// Lists all registered domain names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Returns the registration index of a domain name, used by the domain
    /// identifier to break confidence ties deterministically.
    #[must_use]
    pub fn registration_index(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_domain() -> DomainDefinition {
        let sub = SubDomainDefinition::new(
            "patient_info",
            "patient demographics",
            vec![FieldDefinition::new("patient_name", "full name", FieldType::String).required(true)],
        )
        .unwrap();
        DomainDefinition::new("medical", "medical records", vec![sub])
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = DomainRegistry::new();
        registry.register(sample_domain());
        assert!(registry.get("medical").is_some());
        assert!(registry.get("legal").is_none());
    }

    #[test]
    fn test_get_sub_domain_and_field() {
        let mut registry = DomainRegistry::new();
        registry.register(sample_domain());
        assert!(registry.get_sub_domain("medical", "patient_info").is_some());
        let (sub, field) = registry.get_field("medical", "patient_name").unwrap();
        assert_eq!(sub.name, "patient_info");
        assert_eq!(field.name, "patient_name");
    }

    #[test]
    fn test_last_writer_wins_preserves_order() {
        let mut registry = DomainRegistry::new();
        registry.register(sample_domain());
        let mut replacement = sample_domain();
        replacement.description = "updated".to_string();
        registry.register(replacement);
        assert_eq!(registry.names(), vec!["medical"]);
        assert_eq!(registry.get("medical").unwrap().description, "updated");
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = SubDomainDefinition::new(
            "patient_info",
            "desc",
            vec![
                FieldDefinition::new("name", "a", FieldType::String),
                FieldDefinition::new("name", "b", FieldType::String),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fields_by_priority_order() {
        let sub = SubDomainDefinition::new(
            "s",
            "d",
            vec![
                FieldDefinition::new("low", "l", FieldType::String).priority(1),
                FieldDefinition::new("high", "h", FieldType::String).priority(10),
                FieldDefinition::new("mid", "m", FieldType::String).priority(5),
            ],
        )
        .unwrap();
        let ordered: Vec<&str> = sub.fields_by_priority().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(ordered, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_is_temporal() {
        let date_field = FieldDefinition::new("visit_date", "d", FieldType::String);
        assert!(date_field.is_temporal());
        let typed_date = FieldDefinition::new("dob", "d", FieldType::Date);
        assert!(typed_date.is_temporal());
        let plain = FieldDefinition::new("name", "n", FieldType::String);
        assert!(!plain.is_temporal());
    }

    #[test]
    fn test_registration_index() {
        let mut registry = DomainRegistry::new();
        registry.register(DomainDefinition::new("a", "d", vec![]));
        registry.register(DomainDefinition::new("b", "d", vec![]));
        assert_eq!(registry.registration_index("a"), Some(0));
        assert_eq!(registry.registration_index("b"), Some(1));
        assert_eq!(registry.registration_index("missing"), None);
    }
}
