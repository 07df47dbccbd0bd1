//! Extraction plan and preprocessed query types.

use std::collections::HashMap;

/// Output of the query preprocessor (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct PreprocessedQuery {
    /// The original, unmodified user query.
    pub original: String,
    /// The LLM's reformulated version of the query.
    pub reformulated: String,
    /// Domain the LLM identified, if any.
    pub identified_domain: Option<String>,
    /// Field names the LLM identified as relevant.
    pub identified_fields: Vec<String>,
    /// Free-form extraction requirements surfaced by the LLM.
    pub requirements: HashMap<String, String>,
    /// Confidence in the preprocessing result, in `[0, 1]`.
    pub confidence: f32,
}

impl PreprocessedQuery {
    /// Builds the degraded result returned when parsing fails or
    /// confidence is below the preprocessor's acceptance threshold
    /// (`spec.md` §4.4: `{reformulated = original, confidence = 0}`).
    #[must_use]
    pub fn degraded(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            reformulated: original.clone(),
            original,
            identified_domain: None,
            identified_fields: Vec::new(),
            requirements: HashMap::new(),
            confidence: 0.0,
        }
    }
}

/// The resolved set of `(domain, sub-domains, fields)` for one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionPlan {
    /// Domain to extract against.
    pub domain: String,
    /// Sub-domain names selected within the domain.
    pub sub_domains: Vec<String>,
    /// Optional restriction to specific field names; empty means "all
    /// fields of the selected sub-domains".
    pub fields: Vec<String>,
    /// Output formats requested for this extraction.
    pub output_formats: Vec<String>,
    /// Per-field confidence recorded by the domain identifier, for
    /// downstream inspection and testing (`spec.md` §4.5 "Output fidelity").
    pub field_confidences: HashMap<String, f32>,
}

impl ExtractionPlan {
    /// Creates a plan for a domain with no sub-domain restriction yet.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            sub_domains: Vec::new(),
            fields: Vec::new(),
            output_formats: vec!["structured".to_string()],
            field_confidences: HashMap::new(),
        }
    }

    /// Returns `true` if the plan selects no sub-domains at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sub_domains.is_empty()
    }

    /// The `general/general_content` fallback plan used whenever the
    /// identifier or orchestrator cannot resolve anything better
    /// (`spec.md` §4.5, §4.13, scenario 6).
    #[must_use]
    pub fn fallback() -> Self {
        let mut plan = Self::new("general");
        plan.sub_domains.push("general_content".to_string());
        plan
    }
}

/// Options controlling one `Extract` invocation (`spec.md` §4.7, §6).
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Worker pool size for the parallel extraction engine.
    pub max_concurrency: usize,
    /// Per-job deadline.
    pub request_timeout: std::time::Duration,
    /// Overall extraction deadline; expiry triggers cancellation.
    pub extraction_deadline: Option<std::time::Duration>,
    /// Cosine-similarity threshold above which two string values are
    /// considered duplicates during cross-chunk dedup.
    pub dedup_threshold: f32,
    /// Chunk target size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// Whether to run the query preprocessor before resolving the plan.
    pub run_preprocessor: bool,
    /// Whether keys prefixed with `_` survive the null filter.
    pub preserve_metadata: bool,
    /// Field names exempt from cascade removal in the null filter.
    pub preserve_fields: Vec<String>,
    /// Whether the null filter also strips numeric zeros.
    pub strip_zeros: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 20,
            request_timeout: std::time::Duration::from_secs(60),
            extraction_deadline: None,
            dedup_threshold: 0.9,
            chunk_size: 2000,
            chunk_overlap: 200,
            run_preprocessor: false,
            preserve_metadata: false,
            preserve_fields: Vec::new(),
            strip_zeros: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_query() {
        let query = PreprocessedQuery::degraded("find allergies");
        assert_eq!(query.confidence, 0.0);
        assert_eq!(query.reformulated, query.original);
    }

    #[test]
    fn test_fallback_plan() {
        let plan = ExtractionPlan::fallback();
        assert_eq!(plan.domain, "general");
        assert_eq!(plan.sub_domains, vec!["general_content".to_string()]);
    }

    #[test]
    fn test_plan_is_empty() {
        let plan = ExtractionPlan::new("medical");
        assert!(plan.is_empty());
    }
}
