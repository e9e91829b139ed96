//! Library-backed splitters.
//!
//! Recursive, token and markdown splitting delegate to `text-splitter`; the
//! character splitter splits on one separator and merges the pieces back up
//! to the size limit with a trailing overlap window.

use crate::chunking::config::{DEFAULT_SEPARATORS, SplitterKind, SplitterOptions, validate_size};
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::error::{ChunkingError, Result};
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use text_splitter::{ChunkConfig, ChunkSizer, Characters, MarkdownSplitter, TextSplitter};

/// Sizes chunks with a [`TokenCounter`].
#[derive(Clone)]
pub struct TokenSizer(pub Arc<dyn TokenCounter>);

impl ChunkSizer for TokenSizer {
    fn size(&self, chunk: &str) -> usize {
        self.0.count(chunk)
    }
}

/// Builds a character-sized recursive splitter.
pub(crate) fn recursive_splitter(chunk_size: usize, overlap: usize) -> Result<TextSplitter<Characters>> {
    Ok(TextSplitter::new(chunk_config(chunk_size, overlap)?))
}

fn chunk_config(chunk_size: usize, overlap: usize) -> Result<ChunkConfig<Characters>> {
    validate_size(chunk_size, overlap)?;
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| ChunkingError::InvalidConfig {
            reason: e.to_string(),
        })?
        .with_trim(true);
    Ok(config)
}

enum Backend {
    Recursive(TextSplitter<Characters>),
    Token(TextSplitter<TokenSizer>),
    Markdown(MarkdownSplitter<Characters>),
    Character(String),
}

/// Splitter strategy over the `text-splitter` family.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{ChunkingStrategy, LibrarySplitter, SplitterOptions};
/// use chunkbench::tokenizer::WhitespaceCounter;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let options = SplitterOptions { chunk_size: 20, chunk_overlap: 0, ..SplitterOptions::default() };
/// let splitter = LibrarySplitter::new("Recursive", &options, Arc::new(WhitespaceCounter)).unwrap();
/// let output = splitter.split("First paragraph.\n\nSecond paragraph.").await.unwrap();
/// assert_eq!(output.pieces, vec!["First paragraph.", "Second paragraph."]);
/// # }
/// ```
pub struct LibrarySplitter {
    name: String,
    options: SplitterOptions,
    backend: Backend,
}

impl LibrarySplitter {
    /// Creates a splitter; `counter` sizes the token variant.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero size, an overlap not
    /// smaller than the size, or custom separators on a variant other than
    /// [`SplitterKind::Character`].
    pub fn new(name: &str, options: &SplitterOptions, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        let (size, overlap) = (options.chunk_size, options.chunk_overlap);
        if options.splitter != SplitterKind::Character && options.separators != DEFAULT_SEPARATORS {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "separators only apply to the character splitter, not {}",
                    options.splitter.label()
                ),
            }
            .into());
        }
        let backend = match options.splitter {
            SplitterKind::Recursive => Backend::Recursive(recursive_splitter(size, overlap)?),
            SplitterKind::Token => {
                let config = chunk_config(size, overlap)?.with_sizer(TokenSizer(counter));
                Backend::Token(TextSplitter::new(config))
            }
            SplitterKind::Markdown => Backend::Markdown(MarkdownSplitter::new(chunk_config(size, overlap)?)),
            SplitterKind::Character => {
                validate_size(size, overlap)?;
                let separator = options
                    .separators
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "\n\n".to_string());
                Backend::Character(separator)
            }
        };
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            backend,
        })
    }
}

#[async_trait]
impl ChunkingStrategy for LibrarySplitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    fn separators(&self) -> Option<&[String]> {
        Some(&self.options.separators)
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        let pieces = match &self.backend {
            Backend::Recursive(splitter) => splitter.chunks(text).map(str::to_string).collect(),
            Backend::Token(splitter) => splitter.chunks(text).map(str::to_string).collect(),
            Backend::Markdown(splitter) => splitter.chunks(text).map(str::to_string).collect(),
            Backend::Character(separator) => {
                let splits: Vec<&str> = if separator.is_empty() {
                    text.char_indices()
                        .map(|(i, c)| &text[i..i + c.len_utf8()])
                        .collect()
                } else {
                    text.split(separator.as_str()).filter(|s| !s.is_empty()).collect()
                };
                merge_splits(
                    &splits,
                    separator,
                    self.options.chunk_size,
                    self.options.chunk_overlap,
                )
            }
        };
        Ok(SplitOutput::local(pieces))
    }
}

impl std::fmt::Debug for LibrarySplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibrarySplitter")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Merges splits into chunks of at most `chunk_size` characters, keeping up
/// to `overlap` trailing characters for the next chunk.
///
/// A single split longer than `chunk_size` becomes its own oversized chunk.
fn merge_splits(splits: &[&str], separator: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sep_len = separator.chars().count();
    let mut docs = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    let joined = |current: &VecDeque<&str>| {
        current
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(separator)
            .trim()
            .to_string()
    };

    for &split in splits {
        let len = split.chars().count();
        let sep = if current.is_empty() { 0 } else { sep_len };

        if total + len + sep > chunk_size && !current.is_empty() {
            let doc = joined(&current);
            if !doc.is_empty() {
                docs.push(doc);
            }
            // Drop from the front until what remains fits as overlap
            while total > overlap
                || (total > 0 && total + len + if current.is_empty() { 0 } else { sep_len } > chunk_size)
            {
                let Some(front) = current.pop_front() else {
                    break;
                };
                let front_sep = if current.is_empty() { 0 } else { sep_len };
                total = total.saturating_sub(front.chars().count() + front_sep);
            }
        }

        let sep = if current.is_empty() { 0 } else { sep_len };
        current.push_back(split);
        total += len + sep;
    }

    let doc = joined(&current);
    if !doc.is_empty() {
        docs.push(doc);
    }
    docs
}
