//! Result merging (`spec.md` §4.8).
//!
//! Two stages: per-chunk merge combines every sub-domain's
//! [`PartialResult`] for one chunk into a [`MergedChunkResult`];
//! cross-chunk merge folds every chunk's result into one [`FinalResult`],
//! collapsing `unique` fields to a single best-confidence scalar and
//! deduplicating the rest by embedding similarity.

pub mod dedup;

use crate::embedding::Embedder;
use crate::model::{FinalResult, MergedChunkResult, PartialResult};
use crate::registry::DomainRegistry;
use crate::value::FieldValue;
use dedup::SimilarityIndex;
use std::collections::HashMap;

/// Merges every sub-domain's partial result for a single chunk.
///
/// Later entries in `partials` win on a field-name collision (consistent
/// with [`crate::registry::DomainRegistry::register`]'s last-writer-wins
/// convention), but every contributing sub-domain is still recorded in
/// `provenance`.
#[must_use]
pub fn merge_chunk(chunk_index: usize, partials: &[PartialResult]) -> MergedChunkResult {
    let mut merged = MergedChunkResult {
        chunk_index,
        ..MergedChunkResult::default()
    };

    for partial in partials {
        for (field_name, value) in &partial.field_values {
            merged.provenance.entry(field_name.clone()).or_default().push(partial.sub_domain_name.clone());
            merged
                .confidences
                .entry(field_name.clone())
                .or_default()
                .push(partial.source_confidence);
            if value.is_null() && merged.field_values.contains_key(field_name) {
                continue;
            }
            merged.field_values.insert(field_name.clone(), value.clone());
        }
    }

    merged
}

struct FieldCandidate {
    value: FieldValue,
    confidence: f32,
    chunk_index: usize,
    sub_domains: Vec<String>,
}

/// Cross-chunk merge: folds every chunk's [`MergedChunkResult`] into one
/// [`FinalResult`].
///
/// `unique` fields collapse to whichever chunk produced the highest
/// confidence, ties broken by the lowest chunk index. Other fields
/// accumulate every distinct value seen across chunks (flattening
/// list-typed values), deduplicated by embedding similarity against
/// `dedup_threshold`. A field's aggregate confidence is the max of its
/// per-chunk confidences, not their mean.
#[must_use]
pub fn merge_results(
    chunk_results: &[MergedChunkResult],
    registry: &DomainRegistry,
    domain: &str,
    embedder: &dyn Embedder,
    dedup_threshold: f32,
) -> FinalResult {
    let mut candidates: HashMap<String, Vec<FieldCandidate>> = HashMap::new();

    for chunk_result in chunk_results {
        for (field_name, value) in &chunk_result.field_values {
            if value.is_null() {
                continue;
            }
            let confidence = chunk_result
                .confidences
                .get(field_name)
                .and_then(|cs| cs.iter().copied().fold(None, |acc: Option<f32>, c| Some(acc.map_or(c, |a| a.max(c)))))
                .unwrap_or(1.0);
            let sub_domains = chunk_result.provenance.get(field_name).cloned().unwrap_or_default();
            candidates.entry(field_name.clone()).or_default().push(FieldCandidate {
                value: value.clone(),
                confidence,
                chunk_index: chunk_result.chunk_index,
                sub_domains,
            });
        }
    }

    let mut result = FinalResult::default();

    for (field_name, entries) in candidates {
        let field_def = registry.get_field(domain, &field_name).map(|(_, f)| f);
        let is_unique = field_def.is_some_and(|f| f.unique);
        let is_list_field = field_def.is_some_and(|f| f.field_type == crate::value::FieldType::List)
            || entries.iter().any(|e| matches!(e.value, FieldValue::List(_)));

        let mut provenance: Vec<String> = entries.iter().flat_map(|e| e.sub_domains.iter().cloned()).collect();
        provenance.sort();
        provenance.dedup();
        result.provenance.insert(field_name.clone(), provenance);

        let aggregate_confidence = entries.iter().map(|e| e.confidence).fold(0.0_f32, f32::max);
        result.confidences.insert(field_name.clone(), aggregate_confidence);

        let merged_value = if is_unique {
            entries
                .into_iter()
                .fold(None::<FieldCandidate>, |best, entry| match best {
                    Some(ref current)
                        if entry.confidence < current.confidence
                            || (entry.confidence == current.confidence && entry.chunk_index >= current.chunk_index) =>
                    {
                        best
                    }
                    _ => Some(entry),
                })
                .map_or(FieldValue::Null, |best| best.value)
        } else {
            merge_multi_valued(entries, embedder, dedup_threshold, is_list_field)
        };

        result.field_values.insert(field_name, merged_value);
    }

    result
}

/// Flattens every chunk's value for a non-unique field into one list,
/// deduplicating string entries by embedding similarity. A field declared
/// list-typed keeps its list shape even when exactly one value survives
/// (`spec.md` §4.8: "Lists: concatenate then deduplicate"); any other
/// field collapses to a bare scalar once a single value remains.
fn merge_multi_valued(
    entries: Vec<FieldCandidate>,
    embedder: &dyn Embedder,
    dedup_threshold: f32,
    is_list_field: bool,
) -> FieldValue {
    let mut flat = Vec::new();
    for entry in entries {
        match entry.value {
            FieldValue::List(items) => flat.extend(items),
            other => flat.push(other),
        }
    }

    let mut index = SimilarityIndex::new(embedder, dedup_threshold);
    let mut deduped = Vec::with_capacity(flat.len());
    for value in flat {
        let key = value.display_string();
        if key.is_empty() || index.insert_if_unique(&key) {
            deduped.push(value);
        }
    }

    match deduped.len() {
        0 => FieldValue::Null,
        1 if !is_list_field => deduped.into_iter().next().unwrap_or(FieldValue::Null),
        _ => FieldValue::List(deduped),
    }
}
