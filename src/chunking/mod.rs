//! Text chunking.
//!
//! Splits each [`crate::model::Segment`] into overlapping [`crate::model::Chunk`]s
//! before field extraction fans out over them. The only strategy is the
//! recursive separator splitter: it tries paragraph breaks, then line
//! breaks, then spaces, then raw characters, so chunk boundaries land on
//! the largest natural break that fits `chunk_size`.

pub mod recursive;
pub mod traits;

pub use recursive::RecursiveChunker;
pub use traits::Chunker;

/// Default chunk target size in characters (`spec.md` §6 `ExtractionOptions`).
pub const DEFAULT_CHUNK_SIZE: usize = 2_000;

/// Default overlap between adjacent chunks, in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Upper bound accepted for `chunk_size` in [`crate::model::ExtractionOptions`].
pub const MAX_CHUNK_SIZE: usize = 50_000;

/// Creates the default chunker.
#[must_use]
pub const fn default_chunker() -> RecursiveChunker {
    RecursiveChunker
}
