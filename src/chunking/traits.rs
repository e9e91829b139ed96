//! Chunking strategy trait definition.
//!
//! Defines the interface every strategy implements. The shared
//! [`ChunkProcessor`](crate::chunking::ChunkProcessor) turns a strategy's raw
//! pieces into chunks and a performance report.

use crate::error::Result;
use async_trait::async_trait;

/// Raw output of one split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOutput {
    /// Chunk contents in document order.
    pub pieces: Vec<String>,
    /// External calls made while splitting, for strategies that make them.
    pub external_calls: Option<usize>,
}

impl SplitOutput {
    /// Output of a strategy that makes no external calls.
    #[must_use]
    pub const fn local(pieces: Vec<String>) -> Self {
        Self {
            pieces,
            external_calls: None,
        }
    }
}

/// Trait for splitting text into chunks.
///
/// Implementations must be `Send + Sync` so several strategies can run over
/// the same input concurrently. A strategy holds only its configuration (and,
/// for semantic strategies, an instance-local call counter).
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{ChunkingStrategy, SplitOutput};
/// use chunkbench::Result;
///
/// struct Lines;
///
/// #[async_trait::async_trait]
/// impl ChunkingStrategy for Lines {
///     fn name(&self) -> &str {
///         "Lines"
///     }
///
///     fn target_chunk_size(&self) -> usize {
///         80
///     }
///
///     async fn split(&self, text: &str) -> Result<SplitOutput> {
///         Ok(SplitOutput::local(text.lines().map(str::to_string).collect()))
///     }
/// }
/// ```
#[async_trait]
pub trait ChunkingStrategy: Send + Sync {
    /// Display name used in reports and tables.
    fn name(&self) -> &str;

    /// Configured target chunk size, the denominator of the overlap ratio.
    fn target_chunk_size(&self) -> usize;

    /// Whether adjacent-chunk overlap is measured for this strategy.
    fn tracks_overlap(&self) -> bool {
        true
    }

    /// Separators whose usage in the input is reported, for
    /// separator-driven strategies.
    fn separators(&self) -> Option<&[String]> {
        None
    }

    /// Whether identical input and configuration always yield identical
    /// chunks.
    fn is_deterministic(&self) -> bool {
        true
    }

    /// Splits `text` into ordered pieces.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying splitter or an external service
    /// fails. The processor wraps it as
    /// [`ChunkingError::Failed`](crate::error::ChunkingError::Failed).
    async fn split(&self, text: &str) -> Result<SplitOutput>;
}
