//! Recursive separator-based splitter.
//!
//! Tries each separator in `spec.md`'s priority list
//! `["\n\n", "\n", " ", ""]` in turn: text is merged back together up to
//! `chunk_size`, recursing with the next separator whenever a piece is
//! still too large. The final separator, the empty string, always
//! succeeds by splitting at character boundaries, so the recursion is
//! guaranteed to terminate.

use super::traits::Chunker;
use crate::error::{ChunkingError, Result};
use crate::model::Chunk;

/// Separator priority list used by [`RecursiveChunker`] (`spec.md` §4.3).
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive separator-based chunker.
///
/// # Examples
///
/// ```
/// use extractor::chunking::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker;
/// let text = "Paragraph one.\n\nParagraph two is a little longer than the first.";
/// let chunks = chunker.chunk(0, text, 30, 5).unwrap();
/// assert!(!chunks.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveChunker;

impl Chunker for RecursiveChunker {
    fn chunk(
        &self,
        source_segment_id: usize,
        text: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Vec<Chunk>> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "chunk_size must be > 0".to_string(),
            }
            .into());
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            }
            .into());
        }
        if text.is_empty() {
            return Ok(vec![]);
        }

        let pieces = split_with_offsets(text, 0, &SEPARATORS, chunk_size);
        Ok(assemble_chunks(source_segment_id, text, &pieces, chunk_overlap))
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}

/// A contiguous piece of the original text with its byte offset.
struct Piece {
    offset: usize,
    text: String,
}

/// Splits `text` (whose first byte sits at `base_offset` within the
/// original document) using the first separator in `separators` that
/// keeps every resulting piece at or under `chunk_size`, recursing with
/// the remaining separators on any piece still too large.
fn split_with_offsets(text: &str, base_offset: usize, separators: &[&str], chunk_size: usize) -> Vec<Piece> {
    if text.len() <= chunk_size {
        return vec![Piece {
            offset: base_offset,
            text: text.to_string(),
        }];
    }

    let Some((sep, rest)) = separators.split_first() else {
        return split_by_char_boundary(text, base_offset, chunk_size);
    };

    if sep.is_empty() {
        return split_by_char_boundary(text, base_offset, chunk_size);
    }

    let raw_parts: Vec<&str> = text.split(sep).collect();
    if raw_parts.len() == 1 {
        // Separator does not occur in this text at all; try the next one.
        return split_with_offsets(text, base_offset, rest, chunk_size);
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_offset = base_offset;
    let mut cursor = base_offset;

    for (i, part) in raw_parts.iter().enumerate() {
        let sep_before = if i == 0 { "" } else { *sep };
        let candidate_len = current.len() + sep_before.len() + part.len();

        if candidate_len <= chunk_size {
            if current.is_empty() {
                current_offset = cursor;
            }
            current.push_str(sep_before);
            current.push_str(part);
        } else {
            if !current.is_empty() {
                pieces.push(Piece {
                    offset: current_offset,
                    text: std::mem::take(&mut current),
                });
            }
            let leftover_offset = cursor;
            let leftover = format!("{sep_before}{part}");
            if leftover.len() > chunk_size {
                pieces.extend(split_with_offsets(&leftover, leftover_offset, rest, chunk_size));
            } else {
                current_offset = leftover_offset;
                current = leftover;
            }
        }

        cursor += sep_before.len() + part.len();
    }

    if !current.is_empty() {
        pieces.push(Piece {
            offset: current_offset,
            text: current,
        });
    }

    pieces
}

/// Last-resort split at UTF-8 character boundaries, used once the
/// separator priority list is exhausted.
fn split_by_char_boundary(text: &str, base_offset: usize, chunk_size: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end <= start {
            end = text.len();
        }
        pieces.push(Piece {
            offset: base_offset + start,
            text: text[start..end].to_string(),
        });
        start = end;
    }
    pieces
}

/// Returns the largest byte count `<= max_len` that lands on a char boundary.
fn floor_char_boundary(text: &str, max_len: usize) -> usize {
    let mut len = max_len.min(text.len());
    while len > 0 && !text.is_char_boundary(len) {
        len -= 1;
    }
    len
}

/// Turns ordered, non-overlapping [`Piece`]s into final [`Chunk`]s,
/// prefixing each (after the first) with up to `chunk_overlap` trailing
/// characters of the previous piece.
fn assemble_chunks(source_segment_id: usize, _full_text: &str, pieces: &[Piece], chunk_overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(pieces.len());
    for (index, piece) in pieces.iter().enumerate() {
        if index == 0 || chunk_overlap == 0 {
            chunks.push(Chunk::new(index, piece.text.clone(), source_segment_id, piece.offset));
            continue;
        }
        let prev = &pieces[index - 1];
        let take = floor_char_boundary(&prev.text, chunk_overlap.min(prev.text.len()));
        let overlap_start = prev.text.len() - take;
        let overlap_text = &prev.text[overlap_start..];
        let content = format!("{overlap_text}{}", piece.text);
        let char_offset = piece.offset - overlap_text.len();
        chunks.push(Chunk::new(index, content, source_segment_id, char_offset));
    }
    chunks
}
