//! `FastEmbed`-based semantic embedder.
//!
//! Real semantic embeddings via the all-MiniLM-L6-v2 model, used in place
//! of [`crate::embedding::FallbackEmbedder`] when the `fastembed-embeddings`
//! feature is enabled.

use crate::embedding::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::{EngineError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;

/// Thread-safe singleton for the embedding model.
/// Uses `OnceLock` for lazy initialization on first use.
static EMBEDDING_MODEL: OnceLock<std::sync::Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// `FastEmbed` embedder using all-MiniLM-L6-v2.
///
/// The model is lazily loaded on first `embed()` call to preserve cold
/// start time.
///
/// # Examples
///
/// ```ignore
/// use extractor::embedding::FastEmbedEmbedder;
///
/// let embedder = FastEmbedEmbedder::new()?;
/// let embedding = embedder.embed("Hello, world!")?;
/// assert_eq!(embedding.len(), 384);
/// ```
pub struct FastEmbedEmbedder {
    /// Model name for debugging.
    model_name: &'static str,
}

impl FastEmbedEmbedder {
    /// Creates a new `FastEmbed` embedder.
    ///
    /// Note: Model is lazily loaded on first `embed()` call.
    ///
    /// # Errors
    ///
    /// Returns an error if model initialization fails.
    #[allow(clippy::missing_const_for_fn)]
    pub fn new() -> Result<Self> {
        Ok(Self {
            model_name: "all-MiniLM-L6-v2",
        })
    }

    /// Gets or initializes the embedding model (thread-safe).
    fn get_model() -> Result<&'static std::sync::Mutex<fastembed::TextEmbedding>> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| EngineError::ProviderUnavailable(format!("failed to load embedding model: {e}")))?;

        let _ = EMBEDDING_MODEL.set(std::sync::Mutex::new(model));

        EMBEDDING_MODEL.get().ok_or_else(|| {
            EngineError::ProviderUnavailable("embedding model initialization race condition".to_string()).into()
        })
    }

    /// Returns the model name.
    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        self.model_name
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(crate::error::ChunkingError::InvalidConfig {
                reason: "cannot embed empty text".to_string(),
            }
            .into());
        }

        let model = Self::get_model()?;
        let mut model = model
            .lock()
            .map_err(|e| EngineError::ProviderUnavailable(format!("failed to lock embedding model: {e}")))?;

        let texts = [text];

        // ONNX runtime can panic on malformed inputs; contain it here.
        let result = catch_unwind(AssertUnwindSafe(|| model.embed(texts, None)));

        let embeddings = result
            .map_err(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                EngineError::ProviderUnavailable(format!("onnx runtime panic: {panic_msg}"))
            })?
            .map_err(|e| EngineError::ProviderUnavailable(format!("embedding failed: {e}")))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::ProviderUnavailable("no embedding returned from model".to_string()).into())
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.iter().any(|t| t.is_empty()) {
            return Err(crate::error::ChunkingError::InvalidConfig {
                reason: "cannot embed empty text".to_string(),
            }
            .into());
        }

        let model = Self::get_model()?;
        let mut model = model
            .lock()
            .map_err(|e| EngineError::ProviderUnavailable(format!("failed to lock embedding model: {e}")))?;

        let result = catch_unwind(AssertUnwindSafe(|| model.embed(texts, None)));

        result
            .map_err(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                EngineError::ProviderUnavailable(format!("onnx runtime panic: {panic_msg}")).into()
            })
            .and_then(|r| r.map_err(|e| EngineError::ProviderUnavailable(format!("batch embedding failed: {e}")).into()))
    }
}
