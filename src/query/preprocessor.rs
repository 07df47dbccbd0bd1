//! Query preprocessing (`spec.md` §4.4).
//!
//! Sends the caller's raw natural-language query to the configured
//! [`Completion`] backend to be reformulated into an extraction-oriented
//! form, with any domain/field names and free-form requirements the
//! model can surface. Any failure — unreachable backend, unparseable
//! response, or low-confidence response — degrades to
//! [`PreprocessedQuery::degraded`] rather than failing the extraction.

use crate::llm::Completion;
use crate::model::PreprocessedQuery;
use serde::Deserialize;
use std::collections::HashMap;

/// System prompt for the query preprocessing step.
pub const SYSTEM_PROMPT: &str = r#"You reformulate a user's natural-language extraction request into a precise form and, if possible, identify which domain and fields it refers to.

Return a single JSON object:

{
  "reformulated": "a precise restatement of the request",
  "identified_domain": "domain_name" | null,
  "identified_fields": ["field_one", "field_two"],
  "requirements": {"key": "value"},
  "confidence": 0.0-1.0
}

Set "identified_domain" and "identified_fields" to null/[] when you are not confident. Set "confidence" to how sure you are about the domain/field identification, not about the reformulation itself.

Return ONLY the JSON object."#;

/// Confidence below which a preprocessor response is discarded in favor
/// of [`PreprocessedQuery::degraded`].
pub const ACCEPTANCE_THRESHOLD: f32 = 0.3;

#[derive(Debug, Deserialize)]
struct RawResponse {
    reformulated: String,
    identified_domain: Option<String>,
    #[serde(default)]
    identified_fields: Vec<String>,
    #[serde(default)]
    requirements: HashMap<String, String>,
    confidence: f32,
}

/// Preprocesses `query` through `completion`.
///
/// Never returns an error: a failed or low-confidence call degrades to
/// the original query with zero confidence, same as a `schema_empty`
/// plan resolution downstream would (`spec.md` §4.4 edge case).
pub async fn preprocess(completion: &dyn Completion, query: &str) -> PreprocessedQuery {
    let Ok(raw) = completion.complete(SYSTEM_PROMPT, query).await else {
        return PreprocessedQuery::degraded(query);
    };

    let Ok(parsed) = serde_json::from_str::<RawResponse>(raw.trim()) else {
        return PreprocessedQuery::degraded(query);
    };

    if parsed.confidence < ACCEPTANCE_THRESHOLD {
        return PreprocessedQuery::degraded(query);
    }

    PreprocessedQuery {
        original: query.to_string(),
        reformulated: parsed.reformulated,
        identified_domain: parsed.identified_domain,
        identified_fields: parsed.identified_fields,
        requirements: parsed.requirements,
        confidence: parsed.confidence,
    }
}
