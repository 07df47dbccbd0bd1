//! Per-job, per-chunk and final extraction result types.

use crate::value::FieldValue;
use std::collections::HashMap;

/// A `(chunk, sub-domain)` pair to be sent to the LLM.
#[derive(Debug, Clone)]
pub struct Job {
    /// Index of the chunk to extract from.
    pub chunk_index: usize,
    /// Name of the sub-domain driving this job's prompt.
    pub sub_domain_name: String,
}

impl Job {
    /// Creates a new job.
    #[must_use]
    pub fn new(chunk_index: usize, sub_domain_name: impl Into<String>) -> Self {
        Self {
            chunk_index,
            sub_domain_name: sub_domain_name.into(),
        }
    }
}

/// An LLM-parsed result for one job.
#[derive(Debug, Clone)]
pub struct PartialResult {
    /// Index of the chunk the values were extracted from.
    pub chunk_index: usize,
    /// Sub-domain that produced these values.
    pub sub_domain_name: String,
    /// Extracted field name → value map.
    pub field_values: HashMap<String, FieldValue>,
    /// Confidence assigned to this job's output as a whole (default 1.0).
    pub source_confidence: f32,
}

impl PartialResult {
    /// Creates an empty partial result, used when a job fails or times out
    /// (§4.7: job failures are absorbed, never fatal).
    #[must_use]
    pub fn empty(chunk_index: usize, sub_domain_name: impl Into<String>) -> Self {
        Self {
            chunk_index,
            sub_domain_name: sub_domain_name.into(),
            field_values: HashMap::new(),
            source_confidence: 0.0,
        }
    }

    /// Creates a populated partial result with full confidence.
    #[must_use]
    pub fn new(
        chunk_index: usize,
        sub_domain_name: impl Into<String>,
        field_values: HashMap<String, FieldValue>,
    ) -> Self {
        Self {
            chunk_index,
            sub_domain_name: sub_domain_name.into(),
            field_values,
            source_confidence: 1.0,
        }
    }
}

/// Result of merging every sub-domain partial produced for one chunk.
#[derive(Debug, Clone, Default)]
pub struct MergedChunkResult {
    /// Index of the source chunk.
    pub chunk_index: usize,
    /// Merged field name → value map.
    pub field_values: HashMap<String, FieldValue>,
    /// Which sub-domain(s) produced each field.
    pub provenance: HashMap<String, Vec<String>>,
    /// Confidence(s) recorded for each field.
    pub confidences: HashMap<String, Vec<f32>>,
}

/// Final result after cross-chunk merge, temporal normalization and dedup.
#[derive(Debug, Clone, Default)]
pub struct FinalResult {
    /// Final field name → value map.
    pub field_values: HashMap<String, FieldValue>,
    /// Which sub-domain(s) produced each field, across all chunks.
    pub provenance: HashMap<String, Vec<String>>,
    /// Aggregate confidence recorded for each field.
    pub confidences: HashMap<String, f32>,
}
