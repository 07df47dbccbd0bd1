//! Embedding generation, used by the cross-chunk dedup stage to compare
//! candidate field values by cosine similarity rather than exact string
//! match.
//!
//! # Feature Flags
//!
//! - `fastembed-embeddings`: Enables `FastEmbed` with all-MiniLM-L6-v2 (384 dimensions)
//! - Without the feature: Uses a hash-based fallback (deterministic but not semantic)

mod fallback;

#[cfg(feature = "fastembed-embeddings")]
mod fastembed_impl;

pub use fallback::FallbackEmbedder;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

use crate::error::Result;

/// Default embedding dimensions for the all-MiniLM-L6-v2 model.
///
/// This is the authoritative source for embedding dimensions across the codebase.
/// All vector backends should use this constant for consistency.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for embedding generators.
///
/// Implementations must be thread-safe (`Send + Sync`) to support parallel
/// embedding generation during chunk loading.
///
/// # Examples
///
/// ```
/// use extractor::embedding::{Embedder, FallbackEmbedder, DEFAULT_DIMENSIONS};
///
/// let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
/// let embedding = embedder.embed("Hello, world!").unwrap();
/// assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
/// ```
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts.
    ///
    /// The default implementation calls `embed` for each text sequentially.
    /// Implementations may override this for batch optimization.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails for any text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Creates the default embedder based on available features.
///
/// - With `fastembed-embeddings`: Returns `FastEmbedEmbedder`
/// - Without: Returns `FallbackEmbedder`
///
/// # Errors
///
/// Returns an error if embedder initialization fails.
#[cfg(feature = "fastembed-embeddings")]
pub fn create_embedder() -> Result<Box<dyn Embedder>> {
    Ok(Box::new(FastEmbedEmbedder::new()?))
}

/// Creates the default embedder based on available features.
///
/// - With `fastembed-embeddings`: Returns `FastEmbedEmbedder`
/// - Without: Returns `FallbackEmbedder`
///
/// # Errors
///
/// Returns an error if embedder initialization fails (never fails for fallback).
#[cfg(not(feature = "fastembed-embeddings"))]
pub fn create_embedder() -> Result<Box<dyn Embedder>> {
    Ok(Box::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS)))
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical).
/// For normalized vectors (L2 norm = 1), this is equivalent to the dot product.
///
/// # Panics
///
/// Does not panic but returns 0.0 if vectors have different lengths or zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
