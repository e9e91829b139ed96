//! Separator and window chunking.
//!
//! Splits on a separator regex and packs segments into chunks by token count,
//! or slices fixed character windows.

use crate::chunking::config::{BasicOptions, SplitMethod, validate_size};
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::error::Result;
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// Separator regexes for the segment-based methods.
const SENTENCE_SEPARATOR: &str = r"[.!?]+";
const PARAGRAPH_SEPARATOR: &str = r"\n\s*\n";
const WORD_SEPARATOR: &str = r"\s+";

/// Hand-rolled chunker over characters, words, sentences, or paragraphs.
///
/// Segment methods pack separator-delimited segments (joined with a space)
/// until the next one would exceed `chunk_size` tokens. With a non-zero
/// overlap the last segment of a flushed chunk starts the next one.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{BasicChunker, BasicOptions, ChunkingStrategy, SplitMethod};
/// use chunkbench::tokenizer::WhitespaceCounter;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let options = BasicOptions { chunk_size: 4, chunk_overlap: 0, method: SplitMethod::Word };
/// let chunker = BasicChunker::new("Words", &options, Arc::new(WhitespaceCounter)).unwrap();
/// let output = chunker.split("a b c d e f").await.unwrap();
/// assert_eq!(output.pieces, vec!["a b c d", "e f"]);
/// # }
/// ```
pub struct BasicChunker {
    name: String,
    options: BasicOptions,
    separator: Option<Regex>,
    counter: Arc<dyn TokenCounter>,
}

impl BasicChunker {
    /// Creates a chunker, compiling its separator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero size or an overlap not
    /// smaller than the size.
    pub fn new(name: &str, options: &BasicOptions, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        validate_size(options.chunk_size, options.chunk_overlap)?;
        let separator = match options.method {
            SplitMethod::Character => None,
            SplitMethod::Word => Some(Regex::new(WORD_SEPARATOR)?),
            SplitMethod::Sentence => Some(Regex::new(SENTENCE_SEPARATOR)?),
            SplitMethod::Paragraph => Some(Regex::new(PARAGRAPH_SEPARATOR)?),
        };
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            separator,
            counter,
        })
    }

    /// Segment packing by tokens.
    fn pack_segments(&self, separator: &Regex, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_size = 0;

        for segment in separator.split(text).filter(|s| !s.trim().is_empty()) {
            let segment_size = self.counter.count(segment);

            if current_size + segment_size > self.options.chunk_size && !current.is_empty() {
                chunks.push(current.join(" "));
                if self.options.chunk_overlap > 0 {
                    let last = current[current.len() - 1];
                    current = vec![last];
                    current_size = self.counter.count(last);
                } else {
                    current.clear();
                    current_size = 0;
                }
            }

            current.push(segment);
            current_size += segment_size;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        chunks
    }

    /// Fixed windows of `chunk_size` characters.
    fn slice_characters(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.options.chunk_size - self.options.chunk_overlap;
        let mut chunks = Vec::with_capacity(chars.len() / step + 1);
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.options.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            start += step;
        }
        chunks
    }
}

#[async_trait]
impl ChunkingStrategy for BasicChunker {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        let pieces = match &self.separator {
            Some(separator) => self.pack_segments(separator, text),
            None => self.slice_characters(text),
        };
        Ok(SplitOutput::local(pieces))
    }
}

impl std::fmt::Debug for BasicChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicChunker")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
