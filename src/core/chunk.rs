//! Chunk representation.
//!
//! Chunks are the ordered spans of text a chunking strategy produces. Their
//! order within a sequence is document order and is the only meaningful
//! order.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span of text produced by a chunking strategy.
///
/// # Examples
///
/// ```
/// use chunkbench::core::Chunk;
///
/// let chunk = Chunk::new("Hello, world!".to_string(), 0, 4);
/// assert_eq!(chunk.size(), 13);
/// assert_eq!(chunk.token_count, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk content.
    pub content: String,

    /// Position within the sequence (0-based).
    pub index: usize,

    /// Token count as measured by the run's token counter.
    pub token_count: usize,

    /// Provenance metadata.
    pub metadata: ChunkMetadata,
}

/// Provenance of a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunking strategy that created this chunk.
    pub strategy: Option<String>,

    /// Byte range in the source text, when it could be located.
    pub byte_range: Option<Range<usize>>,

    /// Content hash for deduplication.
    pub content_hash: Option<String>,
}

impl Chunk {
    /// Creates a new chunk without provenance.
    #[must_use]
    pub fn new(content: String, index: usize, token_count: usize) -> Self {
        Self {
            content,
            index,
            token_count,
            metadata: ChunkMetadata::default(),
        }
    }

    /// Creates a chunk tagged with the strategy that produced it.
    #[must_use]
    pub fn with_strategy(content: String, index: usize, token_count: usize, strategy: &str) -> Self {
        let mut chunk = Self::new(content, index, token_count);
        chunk.metadata.strategy = Some(strategy.to_string());
        chunk
    }

    /// Returns the size of the chunk in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Checks if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Sets the source byte range.
    pub const fn set_byte_range(&mut self, range: Range<usize>) {
        self.metadata.byte_range = Some(range);
    }

    /// Computes and sets the content hash.
    pub fn compute_hash(&mut self) {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.content.hash(&mut hasher);
        self.metadata.content_hash = Some(format!("{:016x}", hasher.finish()));
    }

    /// Returns a preview of the chunk content (at most `max_len` bytes, cut
    /// on a character boundary).
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let end = find_char_boundary(&self.content, max_len);
            &self.content[..end]
        }
    }
}

/// Joins chunk contents with `separator`, in sequence order.
#[must_use]
pub fn join_contents(chunks: &[Chunk], separator: &str) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Finds a valid UTF-8 character boundary at or before the given position.
fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new() {
        let chunk = Chunk::new("Hello".to_string(), 0, 1);
        assert_eq!(chunk.content, "Hello");
        assert_eq!(chunk.index, 0);
        assert!(chunk.metadata.strategy.is_none());
        assert!(chunk.metadata.byte_range.is_none());
    }

    #[test]
    fn test_chunk_with_strategy() {
        let chunk = Chunk::with_strategy("content".to_string(), 2, 1, "Basic Word");
        assert_eq!(chunk.metadata.strategy.as_deref(), Some("Basic Word"));
        assert_eq!(chunk.index, 2);
    }

    #[test]
    fn test_chunk_preview_multibyte() {
        let chunk = Chunk::new("héllo wörld".to_string(), 0, 2);
        // 'é' spans bytes 1..3, so a 2-byte preview stops before it
        assert_eq!(chunk.preview(2), "h");
        assert_eq!(chunk.preview(100), "héllo wörld");
    }

    #[test]
    fn test_compute_hash_stable() {
        let mut a = Chunk::new("same".to_string(), 0, 1);
        let mut b = Chunk::new("same".to_string(), 5, 1);
        a.compute_hash();
        b.compute_hash();
        assert_eq!(a.metadata.content_hash, b.metadata.content_hash);
        assert_eq!(a.metadata.content_hash.as_ref().map(String::len), Some(16));
    }

    #[test]
    fn test_join_contents() {
        let chunks = vec![
            Chunk::new("one".to_string(), 0, 1),
            Chunk::new("two".to_string(), 1, 1),
        ];
        assert_eq!(join_contents(&chunks, "\n"), "one\ntwo");
        assert_eq!(join_contents(&[], "\n"), "");
    }

    #[test]
    fn test_chunk_serialization() {
        let mut chunk = Chunk::with_strategy("text".to_string(), 0, 1, "Sentence");
        chunk.set_byte_range(4..8);
        let json = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
