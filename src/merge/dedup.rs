//! Embedding-based cross-chunk deduplication (`spec.md` §4.8).
//!
//! A small, per-extraction linear-scan nearest-neighbor index. Values
//! gathered by one extraction rarely exceed a few hundred candidates, so
//! an O(n²) scan is both simpler and faster in practice than building
//! and tearing down an HNSW index per field.

use crate::embedding::{Embedder, cosine_similarity};

/// Drops candidates whose embedding is more similar than `threshold` to
/// one already kept. Similarity is cosine similarity in `[-1, 1]`;
/// "drop if similarity exceeds threshold" is this codebase's resolved
/// convention for what counts as a duplicate (`spec.md` §9).
pub struct SimilarityIndex<'e> {
    embedder: &'e dyn Embedder,
    threshold: f32,
    kept: Vec<Vec<f32>>,
}

impl<'e> SimilarityIndex<'e> {
    /// Creates an empty index.
    #[must_use]
    pub const fn new(embedder: &'e dyn Embedder, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
            kept: Vec::new(),
        }
    }

    /// Embeds `text` and inserts it if no kept entry is similar enough to
    /// count as a duplicate. Returns `true` if inserted.
    pub fn insert_if_unique(&mut self, text: &str) -> bool {
        let Ok(embedding) = self.embedder.embed(text) else {
            // Embedding failure: keep the value rather than silently drop it.
            self.kept.push(Vec::new());
            return true;
        };
        let is_duplicate = self
            .kept
            .iter()
            .any(|existing| !existing.is_empty() && cosine_similarity(existing, &embedding) > self.threshold);
        if is_duplicate {
            return false;
        }
        self.kept.push(embedding);
        true
    }
}

/// Deduplicates `values` in order, keeping the first occurrence of each
/// semantic cluster.
#[must_use]
pub fn dedup_strings(embedder: &dyn Embedder, threshold: f32, values: Vec<String>) -> Vec<String> {
    let mut index = SimilarityIndex::new(embedder, threshold);
    values.into_iter().filter(|v| index.insert_if_unique(v)).collect()
}
