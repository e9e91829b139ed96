//! Multi-stage chunking pipelines.
//!
//! Each stage receives the previous stage's chunk contents joined with a
//! newline. Batch execution runs every input through the whole pipeline
//! independently and concurrently.

use crate::chunking::{ChunkProcessor, ChunkerResult, ChunkingStrategy};
use crate::core::{Chunk, join_contents};
use crate::error::Result;
use futures_util::future::join_all;

/// Delimiter used to rejoin chunks between stages.
pub const STAGE_DELIMITER: &str = "\n";

/// An ordered sequence of chunking stages.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{ChunkProcessor, PreprocessOptions, TextPreprocessor};
/// use chunkbench::pipeline::Pipeline;
/// use chunkbench::tokenizer::WhitespaceCounter;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut pipeline = Pipeline::new(ChunkProcessor::new(Arc::new(WhitespaceCounter)));
/// pipeline.add_step(Box::new(TextPreprocessor::new("pre", &PreprocessOptions::default()).unwrap()));
///
/// let result = pipeline.execute("The Rivers, and the Deltas.").await.unwrap();
/// assert_eq!(result.contents(), vec!["rivers deltas"]);
/// # }
/// ```
pub struct Pipeline {
    processor: ChunkProcessor,
    steps: Vec<Box<dyn ChunkingStrategy>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(processor: ChunkProcessor) -> Self {
        Self {
            processor,
            steps: Vec::new(),
        }
    }

    /// Appends a stage.
    pub fn add_step(&mut self, step: Box<dyn ChunkingStrategy>) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if there are no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs `text` through every stage and returns the last stage's result.
    ///
    /// Without stages the input comes back as a single chunk (none for
    /// empty input).
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; later stages do not run.
    pub async fn execute(&self, text: &str) -> Result<ChunkerResult> {
        if self.steps.is_empty() {
            return Ok(self.passthrough(text));
        }

        let mut input = text.to_string();
        let mut result = ChunkerResult::empty();
        for (i, step) in self.steps.iter().enumerate() {
            result = self.processor.process(step.as_ref(), &input).await?;
            tracing::debug!(
                stage = i,
                strategy = step.name(),
                chunks = result.chunks.len(),
                "pipeline stage complete"
            );
            input = join_contents(&result.chunks, STAGE_DELIMITER);
        }
        Ok(result)
    }

    /// Runs each input through the whole pipeline concurrently.
    ///
    /// Results are in input order; one input failing does not affect the
    /// others.
    pub async fn execute_batch(&self, texts: &[String]) -> Vec<Result<ChunkerResult>> {
        join_all(texts.iter().map(|text| self.execute(text))).await
    }

    fn passthrough(&self, text: &str) -> ChunkerResult {
        if text.trim().is_empty() {
            return ChunkerResult::empty();
        }
        let tokens = self.processor.counter().count(text);
        ChunkerResult {
            chunks: vec![Chunk::new(text.to_string(), 0, tokens)],
            ..ChunkerResult::empty()
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
