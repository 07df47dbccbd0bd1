//! Chunker trait definition.
//!
//! Defines the interface chunking strategies implement, enabling
//! pluggable text segmentation approaches.

use crate::error::Result;
use crate::model::Chunk;

/// Trait for chunking text into processable segments.
///
/// Implementations must be `Send + Sync` and deterministic for the same
/// input (`spec.md` §4.3 guarantees).
pub trait Chunker: Send + Sync {
    /// Chunks the input text into segments.
    ///
    /// # Arguments
    ///
    /// * `source_segment_id` - Id of the source segment being chunked.
    /// * `text` - The input text to chunk.
    /// * `chunk_size` - Target size for each chunk, in characters.
    /// * `chunk_overlap` - Maximum overlap between adjacent chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (zero size,
    /// overlap ≥ size) or the splitter cannot make forward progress.
    fn chunk(
        &self,
        source_segment_id: usize,
        text: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Vec<Chunk>>;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalChunker;

    impl Chunker for MinimalChunker {
        fn chunk(
            &self,
            _source_segment_id: usize,
            _text: &str,
            _chunk_size: usize,
            _chunk_overlap: usize,
        ) -> Result<Vec<Chunk>> {
            Ok(vec![])
        }

        fn name(&self) -> &'static str {
            "minimal"
        }
    }

    #[test]
    fn test_minimal_chunker_name() {
        assert_eq!(MinimalChunker.name(), "minimal");
    }
}
