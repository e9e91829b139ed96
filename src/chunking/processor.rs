//! Runs a strategy over one input and measures it.

use crate::analysis::{
    Clock, MemoryProbe, ProcessMemoryProbe, StatisticsOptions, SystemClock, compute_statistics,
    count_separators,
};
use crate::chunking::traits::ChunkingStrategy;
use crate::core::{Chunk, Measurement, PerformanceReport};
use crate::error::{ChunkingError, Error, Result};
use crate::tokenizer::TokenCounter;
use serde::Serialize;
use std::sync::Arc;

/// Chunks and report of one strategy run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkerResult {
    /// Chunks in document order.
    pub chunks: Vec<Chunk>,
    /// Performance report for the run.
    pub report: PerformanceReport,
}

impl ChunkerResult {
    /// Result of a run over empty or whitespace-only input.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Chunk contents in order.
    #[must_use]
    pub fn contents(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.content.as_str()).collect()
    }
}

/// Turns a strategy's raw pieces into chunks and a performance report.
///
/// The clock and memory probe are sampled around the split and the
/// statistics pass; everything else in the report is derived from content.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{BasicChunker, BasicOptions, ChunkProcessor, SplitMethod};
/// use chunkbench::tokenizer::WhitespaceCounter;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let counter = Arc::new(WhitespaceCounter);
/// let options = BasicOptions { chunk_size: 3, chunk_overlap: 0, method: SplitMethod::Word };
/// let strategy = BasicChunker::new("Words", &options, counter.clone()).unwrap();
///
/// let result = ChunkProcessor::new(counter).process(&strategy, "a b c d").await.unwrap();
/// assert_eq!(result.contents(), vec!["a b c", "d"]);
/// assert_eq!(result.report.chunks_created, 2);
/// # }
/// ```
#[derive(Clone)]
pub struct ChunkProcessor {
    counter: Arc<dyn TokenCounter>,
    clock: Arc<dyn Clock>,
    memory: Arc<dyn MemoryProbe>,
}

impl ChunkProcessor {
    /// Creates a processor using the system clock and process memory.
    #[must_use]
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self::with_probes(counter, Arc::new(SystemClock::new()), Arc::new(ProcessMemoryProbe))
    }

    /// Creates a processor with explicit probes.
    #[must_use]
    pub fn with_probes(
        counter: Arc<dyn TokenCounter>,
        clock: Arc<dyn Clock>,
        memory: Arc<dyn MemoryProbe>,
    ) -> Self {
        Self {
            counter,
            clock,
            memory,
        }
    }

    /// The token counter used for chunk sizes.
    #[must_use]
    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    /// Runs `strategy` over `text`.
    ///
    /// Empty or whitespace-only input yields no chunks and an empty report
    /// without invoking the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::Failed`] if the strategy fails. No partial
    /// chunks are returned.
    pub async fn process(&self, strategy: &dyn ChunkingStrategy, text: &str) -> Result<ChunkerResult> {
        if text.trim().is_empty() {
            return Ok(ChunkerResult::empty());
        }

        let name = strategy.name();
        let started_ms = self.clock.now_ms();
        let started_bytes = self.memory.resident_bytes();

        let output = strategy
            .split(text)
            .await
            .map_err(|e| wrap_failure(name, text.len(), e))?;

        let options = if strategy.tracks_overlap() {
            StatisticsOptions::with_overlap(strategy.target_chunk_size())
        } else {
            StatisticsOptions::without_overlap()
        };
        let content = compute_statistics(&output.pieces, &options, self.counter.as_ref())
            .map_err(|e| wrap_failure(name, text.len(), e))?;
        let separators = strategy.separators().map(|s| count_separators(text, s));

        let measurement = Measurement {
            elapsed_ms: (self.clock.now_ms() - started_ms).max(0.0),
            memory_delta_bytes: memory_delta(started_bytes, self.memory.resident_bytes()),
        };

        let chunks = build_chunks(text, output.pieces, &content.token_counts, name);
        let report = PerformanceReport::assemble(content, measurement, separators, output.external_calls);

        tracing::debug!(
            strategy = name,
            chunks = report.chunks_created,
            tokens = report.tokens_processed,
            elapsed_ms = report.total_time_ms,
            "strategy run complete"
        );

        Ok(ChunkerResult { chunks, report })
    }
}

impl std::fmt::Debug for ChunkProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkProcessor")
            .field("counter", &self.counter.name())
            .finish_non_exhaustive()
    }
}

/// Wraps a strategy error once; an existing `Failed` passes through.
fn wrap_failure(strategy: &str, input_len: usize, err: Error) -> Error {
    match err {
        Error::Chunking(ChunkingError::Failed { .. }) => err,
        other => ChunkingError::Failed {
            strategy: strategy.to_string(),
            input_len,
            reason: other.to_string(),
        }
        .into(),
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn memory_delta(before: u64, after: u64) -> i64 {
    after as i64 - before as i64
}

/// Builds chunks, locating each piece in the source when it appears there
/// verbatim.
fn build_chunks(text: &str, pieces: Vec<String>, token_counts: &[usize], strategy: &str) -> Vec<Chunk> {
    let mut search_from = 0;
    pieces
        .into_iter()
        .zip(token_counts.iter().copied())
        .enumerate()
        .map(|(index, (content, tokens))| {
            let mut chunk = Chunk::with_strategy(content, index, tokens, strategy);
            if let Some(offset) = text.get(search_from..).and_then(|rest| rest.find(&chunk.content)) {
                let start = search_from + offset;
                chunk.set_byte_range(start..start + chunk.content.len());
                search_from = next_char_boundary(text, start + 1);
            }
            chunk.compute_hash();
            chunk
        })
        .collect()
}

fn next_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FixedMemory, StepClock};
    use crate::chunking::traits::SplitOutput;
    use crate::error::ExternalError;
    use crate::tokenizer::WhitespaceCounter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed {
        pieces: Vec<&'static str>,
        called: AtomicBool,
    }

    impl Fixed {
        fn new(pieces: Vec<&'static str>) -> Self {
            Self {
                pieces,
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ChunkingStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn target_chunk_size(&self) -> usize {
            4
        }

        fn separators(&self) -> Option<&[String]> {
            None
        }

        async fn split(&self, _text: &str) -> Result<SplitOutput> {
            self.called.store(true, Ordering::SeqCst);
            Ok(SplitOutput::local(self.pieces.iter().map(ToString::to_string).collect()))
        }
    }

    struct Broken;

    #[async_trait]
    impl ChunkingStrategy for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn target_chunk_size(&self) -> usize {
            10
        }

        async fn split(&self, _text: &str) -> Result<SplitOutput> {
            Err(ExternalError::Api("boom".to_string()).into())
        }
    }

    fn processor() -> ChunkProcessor {
        ChunkProcessor::with_probes(
            Arc::new(WhitespaceCounter),
            Arc::new(StepClock::new(5.0)),
            Arc::new(FixedMemory(1024)),
        )
    }

    #[tokio::test]
    async fn test_empty_input_skips_strategy() {
        let strategy = Fixed::new(vec!["x"]);
        for text in ["", "   \n\t "] {
            let result = processor().process(&strategy, text).await.unwrap();
            assert!(result.chunks.is_empty());
            assert_eq!(result.report, PerformanceReport::empty());
        }
        assert!(!strategy.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_report_uses_probes() {
        let strategy = Fixed::new(vec!["one two", "two three four"]);
        let result = processor()
            .process(&strategy, "one two three four")
            .await
            .unwrap();
        assert!((result.report.total_time_ms - 5.0).abs() < f64::EPSILON);
        assert_eq!(result.report.memory_delta_bytes, 0);
        assert_eq!(result.report.chunks_created, 2);
        assert_eq!(result.report.tokens_processed, 5);
        assert!(result.report.overlap.is_some());
        assert!(result.report.separators.is_none());
        assert!(result.report.external_calls.is_none());
    }

    #[tokio::test]
    async fn test_chunks_located_in_source() {
        let strategy = Fixed::new(vec!["aa", "aa", "zz"]);
        let result = processor().process(&strategy, "aaa bb").await.unwrap();
        assert_eq!(result.chunks[0].metadata.byte_range, Some(0..2));
        assert_eq!(result.chunks[1].metadata.byte_range, Some(1..3));
        assert_eq!(result.chunks[2].metadata.byte_range, None);
        assert_eq!(result.chunks[2].index, 2);
        assert_eq!(result.chunks[0].metadata.strategy.as_deref(), Some("fixed"));
        assert!(result.chunks[0].metadata.content_hash.is_some());
    }

    #[tokio::test]
    async fn test_failure_wrapped_once() {
        let err = processor().process(&Broken, "some text").await.unwrap_err();
        match err {
            Error::Chunking(ChunkingError::Failed {
                strategy,
                input_len,
                reason,
            }) => {
                assert_eq!(strategy, "broken");
                assert_eq!(input_len, 9);
                assert!(reason.contains("boom"));
                assert!(!reason.contains("failed on"));
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_existing_failure_not_rewrapped() {
        let inner: Error = ChunkingError::Failed {
            strategy: "inner".to_string(),
            input_len: 3,
            reason: "r".to_string(),
        }
        .into();
        let wrapped = wrap_failure("outer", 10, inner);
        assert!(matches!(
            wrapped,
            Error::Chunking(ChunkingError::Failed { ref strategy, .. }) if strategy == "inner"
        ));
    }

    #[test]
    fn test_memory_delta_signed() {
        assert_eq!(memory_delta(10, 4), -6);
        assert_eq!(memory_delta(4, 10), 6);
    }
}
