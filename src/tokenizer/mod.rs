//! Token counting.
//!
//! Chunk sizes are measured in tokens of a fixed external tokenizer. Only the
//! length of the encoding is ever used.

use crate::error::{ExternalError, Result};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Counts tokens in a span of text.
///
/// Implementations are pure and must be `Send + Sync` so one counter can be
/// shared by strategies running concurrently.
pub trait TokenCounter: Send + Sync {
    /// Returns the number of tokens in `text`.
    fn count(&self, text: &str) -> usize;

    /// Returns the tokenizer name.
    fn name(&self) -> &'static str;
}

/// BPE token counter backed by `tiktoken-rs` (`cl100k_base`).
#[derive(Clone)]
pub struct TiktokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    /// Loads the `cl100k_base` encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalError::Tokenizer`] if the encoding cannot be loaded.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| ExternalError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &'static str {
        "cl100k_base"
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.name())
            .finish()
    }
}

/// Counts one token per whitespace-delimited word.
///
/// Deterministic and dependency-free; used where exact token budgets need to
/// be predictable.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
