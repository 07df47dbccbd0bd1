//! Hash-based fallback embedder.
//!
//! Provides deterministic pseudo-embeddings when `FastEmbed` is not available.
//! Uses content hashing to generate reproducible embeddings that cluster
//! similar text together (based on word overlap, not semantics).

use crate::embedding::Embedder;
use crate::error::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash-based fallback embedder.
///
/// Generates deterministic pseudo-embeddings using a combination of:
/// - Word-level hashing for vocabulary capture
/// - Character n-gram hashing for fuzzy matching
/// - Normalization to unit length for cosine similarity
///
/// This is NOT semantic similarity - it's based on lexical overlap.
/// Use `FastEmbed` for true semantic understanding.
///
/// # Examples
///
/// ```
/// use extractor::embedding::{Embedder, FallbackEmbedder, DEFAULT_DIMENSIONS};
///
/// let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
/// let emb1 = embedder.embed("hello world").unwrap();
/// let emb2 = embedder.embed("hello world").unwrap();
/// assert_eq!(emb1, emb2); // Deterministic
/// ```
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl FallbackEmbedder {
    /// Creates a new fallback embedder with the specified dimensions.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Hashes a string to a u64 value.
    fn hash_string(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Generates a pseudo-embedding from text.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        // Normalize text: lowercase and basic cleanup
        let normalized: String = text
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c.to_ascii_lowercase()
                } else {
                    ' '
                }
            })
            .collect();

        // Split into words
        let words: Vec<&str> = normalized.split_whitespace().collect();

        // Word-level hashing (primary signal)
        for word in &words {
            let hash = Self::hash_string(word);
            let idx = (hash as usize) % self.dimensions;
            // Use hash bits to determine sign and magnitude
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            let magnitude = 1.0 + ((hash >> 16) & 0xFF) as f32 / 255.0;
            embedding[idx] += sign * magnitude;
        }

        // Character trigram hashing (secondary signal for fuzzy matching)
        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() >= 3 {
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let hash = Self::hash_string(&trigram);
                let idx = (hash as usize) % self.dimensions;
                let sign = if (hash >> 32) & 1 == 0 { 0.5 } else { -0.5 };
                embedding[idx] += sign;
            }
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Embedder for FallbackEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        // Parallel processing for batch embedding
        use rayon::prelude::*;

        Ok(texts
            .par_iter()
            .map(|text| self.generate_embedding(text))
            .collect())
    }
}

// Implement Send + Sync (required by Embedder trait)
// FallbackEmbedder has no interior mutability, so this is safe
// SAFETY: FallbackEmbedder contains only Copy types (dimensions: usize)
// with no interior mutability, making it safe to send and share across threads.
#[allow(unsafe_code)]
unsafe impl Send for FallbackEmbedder {}
#[allow(unsafe_code)]
unsafe impl Sync for FallbackEmbedder {}
