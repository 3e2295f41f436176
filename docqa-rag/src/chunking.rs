//! Document chunking.
//!
//! [`SentenceChunker`] splits extracted document text into sentence-aligned
//! passages of roughly `target_size` characters. The size is a soft target:
//! sentences are never cut, so one long sentence becomes its own chunk.

use crate::error::{RagError, Result};

/// Default target chunk length in characters.
pub const DEFAULT_TARGET_SIZE: usize = 512;

/// The literal delimiter separating sentence-like units.
const SENTENCE_DELIMITER: &str = ". ";

/// A strategy for splitting raw text into passages.
///
/// Implementations must be pure: identical input always yields identical
/// output.
pub trait Chunker: Send + Sync {
    /// Split text into passages, in document order.
    ///
    /// Returns an empty `Vec` if the text has no content.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Greedily packs `". "`-delimited sentences into chunks.
///
/// A chunk is closed as soon as adding the next sentence would bring its
/// length to `target_size` or beyond. The delimiter is appended after every
/// unit, the last one included, and every emitted chunk is trimmed. Blank
/// units still count toward the buffer length.
///
/// # Example
///
/// ```rust
/// use docqa_rag::chunking::{Chunker, SentenceChunker};
///
/// let chunker = SentenceChunker::new(40).unwrap();
/// let chunks = chunker.chunk("Rust is fast. Rust is safe. Rust has no garbage collector");
/// assert_eq!(chunks, vec!["Rust is fast. Rust is safe.", "Rust has no garbage collector."]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    target_size: usize,
}

impl SentenceChunker {
    /// Create a chunker with the given target size in characters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `target_size` is zero.
    pub fn new(target_size: usize) -> Result<Self> {
        if target_size == 0 {
            return Err(RagError::InvalidArgument(
                "target_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { target_size })
    }

    /// The soft upper bound on chunk length.
    pub fn target_size(&self) -> usize {
        self.target_size
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self { target_size: DEFAULT_TARGET_SIZE }
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut buffer = String::new();
        // Length of `buffer` in chars, tracked to avoid rescanning.
        let mut buffer_len = 0;

        for unit in text.split(SENTENCE_DELIMITER) {
            let unit_len = unit.chars().count();
            if !buffer.is_empty() && buffer_len + unit_len >= self.target_size {
                push_trimmed(&mut chunks, &buffer);
                buffer.clear();
                buffer_len = 0;
            }

            buffer.push_str(unit);
            buffer.push_str(SENTENCE_DELIMITER);
            buffer_len += unit_len + SENTENCE_DELIMITER.len();
        }

        push_trimmed(&mut chunks, &buffer);
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, buffer: &str) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Chunk `text` with a [`SentenceChunker`] of the given target size.
///
/// # Errors
///
/// Returns [`RagError::InvalidArgument`] if `target_size` is zero.
pub fn chunk_text(text: &str, target_size: usize) -> Result<Vec<String>> {
    Ok(SentenceChunker::new(target_size)?.chunk(text))
}
