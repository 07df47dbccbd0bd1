//! Domain identification from document text (`spec.md` §4.5).
//!
//! Scores each registered domain by a composite of exact-phrase, keyword
//! and description-overlap signals, picks the best-scoring domain as a
//! candidate (falling back to the single highest-scoring domain if none
//! clears its threshold), then scores and ranks that domain's fields the
//! same way to pick the top six. Falls back to `general/general_content`
//! when nothing in the registry produces a usable plan.

use crate::model::ExtractionPlan;
use crate::registry::{DomainDefinition, DomainRegistry, FieldDefinition, SubDomainDefinition};

/// Confidence an LLM-identified domain is boosted to, when the query
/// preprocessor named one (`spec.md` §4.5, §9).
const LLM_IDENTIFIED_BOOST: f32 = 0.9;

/// Default minimum field confidence to retain a field in the plan,
/// tunable down to `0.6` for looser recall (`spec.md` §4.5, §9).
const FIELD_MIN_CONFIDENCE_DEFAULT: f32 = 0.8;

/// Overlap-ratio floor that, combined with [`FIELD_MIN_CONFIDENCE_DEFAULT`],
/// retains a field even when its confidence sits below
/// [`FIELD_HIGH_CONFIDENCE`] (`spec.md` §9).
const FIELD_OVERLAP_FLOOR: f32 = 0.2;

/// Field confidence above which overlap ratio no longer gates inclusion
/// (`spec.md` §9).
const FIELD_HIGH_CONFIDENCE: f32 = 0.85;

/// Fields retained per identified domain (`spec.md` §4.5: "top six").
const TOP_FIELD_COUNT: usize = 6;

/// Identifies the best-matching domain and fields for `text`.
///
/// Equivalent to [`identify_with_hint`] with no LLM-identified domain.
#[must_use]
pub fn identify(registry: &DomainRegistry, text: &str) -> ExtractionPlan {
    identify_with_hint(registry, text, None)
}

/// As [`identify`], but boosts `llm_identified_domain`'s confidence to at
/// least [`LLM_IDENTIFIED_BOOST`] when it names a registered domain
/// (`spec.md` §4.5: "an LLM-identified domain, if any, boosts confidence
/// to at least 0.9").
///
/// Returns [`ExtractionPlan::fallback`] if the registry has no domains,
/// or if the winning domain produces no field above its selection
/// thresholds.
#[must_use]
pub fn identify_with_hint(registry: &DomainRegistry, text: &str, llm_identified_domain: Option<&str>) -> ExtractionPlan {
    let normalized = text.to_lowercase();

    let mut scored: Vec<(f32, &DomainDefinition)> = registry
        .list()
        .into_iter()
        .map(|domain| {
            let mut confidence = domain_confidence(domain, &normalized);
            if llm_identified_domain == Some(domain.name.as_str()) {
                confidence = confidence.max(LLM_IDENTIFIED_BOOST);
            }
            (confidence, domain)
        })
        .collect();

    if scored.is_empty() {
        return ExtractionPlan::fallback();
    }

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_idx = registry.registration_index(&a.1.name).unwrap_or(usize::MAX);
                let b_idx = registry.registration_index(&b.1.name).unwrap_or(usize::MAX);
                a_idx.cmp(&b_idx)
            })
    });

    // A domain clearing its own threshold wins outright; otherwise fall
    // back to best-effort on the single highest-scoring domain rather
    // than giving up immediately (`spec.md` §4.5).
    let top_domain = scored
        .iter()
        .find(|(confidence, domain)| *confidence >= domain.confidence_threshold)
        .map_or(scored[0].1, |(_, domain)| *domain);

    let mut plan = ExtractionPlan::new(top_domain.name.clone());

    let mut scored_fields: Vec<(f32, &SubDomainDefinition, &FieldDefinition)> = Vec::new();
    for sub_domain in &top_domain.sub_domains {
        for field in &sub_domain.fields {
            let (confidence, overlap) = field_confidence(sub_domain, field, &normalized);
            plan.field_confidences.insert(field.name.clone(), confidence);
            if confidence >= FIELD_MIN_CONFIDENCE_DEFAULT && (overlap >= FIELD_OVERLAP_FLOOR || confidence >= FIELD_HIGH_CONFIDENCE) {
                scored_fields.push((confidence, sub_domain, field));
            }
        }
    }

    scored_fields.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored_fields.truncate(TOP_FIELD_COUNT);

    let mut sub_domain_names: Vec<String> = Vec::new();
    let mut field_names: Vec<String> = Vec::new();
    for (_, sub_domain, field) in &scored_fields {
        if !sub_domain_names.contains(&sub_domain.name) {
            sub_domain_names.push(sub_domain.name.clone());
        }
        field_names.push(field.name.clone());
    }
    plan.sub_domains = sub_domain_names;
    plan.fields = field_names;

    if plan.sub_domains.is_empty() {
        return ExtractionPlan::fallback();
    }

    plan
}

/// Composite domain confidence: exact-phrase match on the domain name,
/// weighted keyword coverage, and description-term overlap.
fn domain_confidence(domain: &DomainDefinition, normalized_text: &str) -> f32 {
    let exact_phrase = if normalized_text.contains(&domain.name.to_lowercase()) { 1.0 } else { 0.0 };
    let keyword = keyword_component(&domain.keywords, normalized_text);
    let overlap = description_overlap(&domain.description, normalized_text);
    (0.3 * exact_phrase + 0.5 * keyword + 0.2 * overlap).min(1.0)
}

/// Composite field confidence and its overlap ratio: name-token match,
/// description-term presence, keyword coverage, and a small boost when
/// the owning sub-domain's own name terms appear in the text.
fn field_confidence(sub_domain: &SubDomainDefinition, field: &FieldDefinition, normalized_text: &str) -> (f32, f32) {
    let name_score = term_overlap(field.name.split('_'), normalized_text);
    let desc_score = term_overlap(field.description.split_whitespace().filter(|w| w.len() > 2), normalized_text);
    let keyword_score = keyword_component(&field.keywords, normalized_text);
    let sub_domain_boost = if term_overlap(sub_domain.name.split('_'), normalized_text) > 0.0 { 0.15 } else { 0.0 };

    let overlap = (name_score + desc_score) / 2.0;
    let confidence = (0.4 * name_score + 0.2 * desc_score + 0.4 * keyword_score + sub_domain_boost).min(1.0);
    (confidence, overlap)
}

/// Fraction of `terms` that occur (case-insensitively) in `normalized_text`.
fn term_overlap<'a>(terms: impl Iterator<Item = &'a str>, normalized_text: &str) -> f32 {
    let terms: Vec<String> = terms.filter(|t| !t.is_empty()).map(str::to_lowercase).collect();
    if terms.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let hits = terms.iter().filter(|t| normalized_text.contains(t.as_str())).count() as f32;
    #[allow(clippy::cast_precision_loss)]
    let total = terms.len() as f32;
    hits / total
}

/// Same overlap ratio as [`term_overlap`], but multi-word keywords count
/// for double weight, matching `spec.md` §4.5's "multi-word keyword
/// matches are weighted more strongly than single-word matches". A
/// domain/field declaring no keywords scores `1.0` (never excluded on
/// keyword grounds alone).
fn keyword_component(keywords: &[String], normalized_text: &str) -> f32 {
    if keywords.is_empty() {
        return 1.0;
    }
    let mut weight_sum = 0.0_f32;
    let mut hit_sum = 0.0_f32;
    for kw in keywords {
        let weight = if kw.trim().contains(' ') { 2.0 } else { 1.0 };
        weight_sum += weight;
        if normalized_text.contains(&kw.to_lowercase()) {
            hit_sum += weight;
        }
    }
    if weight_sum == 0.0 { 1.0 } else { hit_sum / weight_sum }
}

/// Fraction of `description`'s distinct, non-trivial words (longer than
/// three characters) that occur in `normalized_text`.
fn description_overlap(description: &str, normalized_text: &str) -> f32 {
    term_overlap(description.split_whitespace().filter(|w| w.len() > 3), normalized_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldDefinition;
    use crate::value::FieldType;

    fn registry_with_medical_and_legal() -> DomainRegistry {
        let mut registry = DomainRegistry::new();

        let patient_info = SubDomainDefinition::new(
            "patient_info",
            "patient demographics",
            vec![FieldDefinition::new("patient_name", "full name of the patient", FieldType::String)
                .keywords(["patient", "name"])
                .required(true)],
        )
        .unwrap();
        let medical = DomainDefinition::new("medical", "medical records", vec![patient_info])
            .keywords(["diagnosis", "patient", "treatment"]);
        registry.register(medical);

        let parties = SubDomainDefinition::new(
            "parties",
            "contract parties",
            vec![FieldDefinition::new("plaintiff", "name of the plaintiff party", FieldType::String).keywords(["plaintiff"])],
        )
        .unwrap();
        let legal = DomainDefinition::new("legal", "legal documents", vec![parties])
            .keywords(["plaintiff", "defendant", "court"]);
        registry.register(legal);

        registry
    }

    #[test]
    fn test_identifies_medical_domain() {
        let registry = registry_with_medical_and_legal();
        let plan = identify(
            &registry,
            "Patient name: John Doe. Patient diagnosis: diabetes. Treatment: insulin therapy.",
        );
        assert_eq!(plan.domain, "medical");
        assert!(plan.sub_domains.contains(&"patient_info".to_string()));
        assert!(plan.fields.contains(&"patient_name".to_string()));
    }

    #[test]
    fn test_identifies_legal_domain() {
        let registry = registry_with_medical_and_legal();
        let plan = identify(
            &registry,
            "The plaintiff name: Acme Corp. The plaintiff and defendant appeared before the court.",
        );
        assert_eq!(plan.domain, "legal");
    }

    #[test]
    fn test_falls_back_when_no_keywords_match() {
        let registry = registry_with_medical_and_legal();
        let plan = identify(&registry, "completely unrelated text about gardening");
        assert_eq!(plan.domain, "general");
    }

    #[test]
    fn test_falls_back_on_empty_registry() {
        let registry = DomainRegistry::new();
        let plan = identify(&registry, "anything at all");
        assert_eq!(plan.domain, "general");
    }

    #[test]
    fn test_llm_hint_promotes_domain_despite_weaker_keyword_score() {
        let mut registry = DomainRegistry::new();

        let widget_field = FieldDefinition::new("widget_id", "identifier of the widget", FieldType::String).keywords(["widget"]);
        let widget_sub = SubDomainDefinition::new("widgets", "widget records", vec![widget_field]).unwrap();
        registry.register(DomainDefinition::new("alpha", "alpha domain", vec![widget_sub]).keywords(["zzz_no_match"]));

        let other_field = FieldDefinition::new("other", "other field", FieldType::String);
        let other_sub = SubDomainDefinition::new("misc", "misc", vec![other_field]).unwrap();
        registry.register(DomainDefinition::new("beta", "beta domain", vec![other_sub]).keywords(["common"]));

        let text = "this document mentions a common widget identifier value";

        // Without a hint, `beta` scores highest on its keyword match but
        // has no field that clears the selection floor, so the plan
        // degrades to `general`.
        let unhinted = identify(&registry, text);
        assert_eq!(unhinted.domain, "general");

        // With `alpha` named by the preprocessor, its confidence is
        // boosted above `beta`'s and its matching field is selected.
        let hinted = identify_with_hint(&registry, text, Some("alpha"));
        assert_eq!(hinted.domain, "alpha");
        assert!(hinted.fields.contains(&"widget_id".to_string()));
    }

    #[test]
    fn test_limits_to_top_six_fields() {
        let mut fields = Vec::new();
        for i in 0..10 {
            fields.push(
                FieldDefinition::new(format!("notable_value_{i}"), "a notable value", FieldType::String)
                    .keywords(["notable", "value"]),
            );
        }
        let sub = SubDomainDefinition::new("bucket", "a bucket of fields", fields).unwrap();
        let mut registry = DomainRegistry::new();
        registry.register(DomainDefinition::new("misc", "misc notable values", vec![sub]).keywords(["notable"]));

        let plan = identify(&registry, "this document has a notable value worth extracting");
        assert_eq!(plan.domain, "misc");
        assert_eq!(plan.fields.len(), 6);
    }
}
