//! Chunk-size sweep: retrieval-augmented answering at each chunk size.
//!
//! For each size the text is split, indexed into an in-memory store and
//! every generated question is answered from retrieved context. Answers are
//! timed and judged for faithfulness and relevancy.

use crate::analysis::{Clock, SystemClock};
use crate::chunking::{ChunkingStrategy, LibrarySplitter, SplitterKind, SplitterOptions};
use crate::embedding::Embedder;
use crate::error::{EvaluationError, Result};
use crate::evaluation::evaluator::mean;
use crate::evaluation::judge::{QueryResponse, ResponseEvaluator};
use crate::evaluation::model::LanguageModel;
use crate::evaluation::prompt::build_answer_prompt;
use crate::evaluation::questions::{DEFAULT_QUESTION_COUNT, QuestionGenerator};
use crate::evaluation::score::{SWEEP_WEIGHTS, best_index};
use crate::store::{
    CONTEXT_DELIMITER, ChunkStore, DEFAULT_TOP_K, HybridRetriever, SqliteStore, build_records,
};
use crate::tokenizer::TokenCounter;
use futures_util::future::try_join;
use serde::Serialize;
use std::sync::Arc;

/// Chunk sizes swept by default, in tokens.
pub const DEFAULT_SWEEP_SIZES: [usize; 5] = [128, 256, 512, 1024, 2048];

/// Token overlap between sweep chunks, capped below the chunk size.
pub const SWEEP_OVERLAP: usize = 20;

/// Averages for one chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepResult {
    /// Chunk size in tokens.
    pub chunk_size: usize,
    /// Chunks indexed at this size.
    pub chunks: usize,
    /// Average retrieve-and-answer time, in seconds.
    pub average_response_time_s: f64,
    /// Average faithfulness of the answers.
    pub average_faithfulness: f64,
    /// Average relevancy of the answers.
    pub average_relevancy: f64,
}

impl SweepResult {
    /// Combined ranking score with the sweep weights.
    #[must_use]
    pub fn combined(&self) -> f64 {
        SWEEP_WEIGHTS.combine(
            self.average_response_time_s,
            self.average_faithfulness,
            self.average_relevancy,
        )
    }
}

/// Collaborators of a sweep.
pub struct ChunkSizeSweep {
    sizes: Vec<usize>,
    questions: usize,
    top_k: usize,
    counter: Arc<dyn TokenCounter>,
    embedder: Arc<dyn Embedder>,
    answerer: Arc<dyn LanguageModel>,
    generator: QuestionGenerator,
    judge: ResponseEvaluator,
    clock: Arc<dyn Clock>,
}

impl ChunkSizeSweep {
    /// Creates a sweep over [`DEFAULT_SWEEP_SIZES`].
    ///
    /// `judge` scores answers and writes the questions; `answerer` answers
    /// them from retrieved context.
    #[must_use]
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        embedder: Arc<dyn Embedder>,
        judge: Arc<dyn LanguageModel>,
        answerer: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            sizes: DEFAULT_SWEEP_SIZES.to_vec(),
            questions: DEFAULT_QUESTION_COUNT,
            top_k: DEFAULT_TOP_K,
            counter,
            embedder,
            answerer,
            generator: QuestionGenerator::new(Arc::clone(&judge)),
            judge: ResponseEvaluator::new(judge),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Sets the chunk sizes, in sweep order.
    #[must_use]
    pub fn with_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Sets the number of generated questions.
    #[must_use]
    pub const fn with_questions(mut self, questions: usize) -> Self {
        self.questions = questions;
        self
    }

    /// Sets how many chunks are retrieved per question.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Replaces the clock timing answers.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Generates questions once, then evaluates every size in order.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::NoQuestions`] if no question could be
    /// generated, a configuration error for an invalid size, or the first
    /// model, embedding or store failure.
    pub async fn run(&self, text: &str) -> Result<Vec<SweepResult>> {
        let questions = self.generator.generate(text, self.questions).await?;
        tracing::info!(questions = questions.len(), sizes = ?self.sizes, "sweep started");

        let mut results = Vec::with_capacity(self.sizes.len());
        for &size in &self.sizes {
            let result = self.evaluate_size(text, &questions, size).await?;
            tracing::info!(
                chunk_size = size,
                response_time_s = result.average_response_time_s,
                faithfulness = result.average_faithfulness,
                relevancy = result.average_relevancy,
                "chunk size evaluated"
            );
            results.push(result);
        }
        Ok(results)
    }

    async fn evaluate_size(&self, text: &str, questions: &[String], size: usize) -> Result<SweepResult> {
        let options = SplitterOptions {
            splitter: SplitterKind::Token,
            chunk_size: size,
            chunk_overlap: SWEEP_OVERLAP.min(size.saturating_sub(1)),
            ..SplitterOptions::default()
        };
        let splitter = LibrarySplitter::new(&format!("sweep-{size}"), &options, Arc::clone(&self.counter))?;
        let chunks = splitter.split(text).await?.pieces;

        let store = Arc::new(SqliteStore::in_memory()?);
        store.write_records(&build_records(&chunks, self.embedder.as_ref()).await?)?;
        let retriever = HybridRetriever::new(store, Arc::clone(&self.embedder))?;

        let mut times = Vec::with_capacity(questions.len());
        let mut faithfulness = Vec::with_capacity(questions.len());
        let mut relevancy = Vec::with_capacity(questions.len());

        for question in questions {
            let started_ms = self.clock.now_ms();
            let hits = retriever.search(question, self.top_k).await?;
            let sources: Vec<String> = hits.into_iter().map(|h| h.content).collect();
            let context = sources.join(CONTEXT_DELIMITER);
            let answer = self.answerer.complete(&build_answer_prompt(question, &context)).await?;
            times.push((self.clock.now_ms() - started_ms).max(0.0) / 1000.0);

            let response = QueryResponse {
                response: answer,
                sources,
            };
            let (f, r) = try_join(
                self.judge.faithfulness(&response),
                self.judge.relevancy(question, &response),
            )
            .await?;
            faithfulness.push(f.score);
            relevancy.push(r.score);
        }

        Ok(SweepResult {
            chunk_size: size,
            chunks: chunks.len(),
            average_response_time_s: mean(times),
            average_faithfulness: mean(faithfulness),
            average_relevancy: mean(relevancy),
        })
    }
}

impl std::fmt::Debug for ChunkSizeSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkSizeSweep")
            .field("sizes", &self.sizes)
            .field("questions", &self.questions)
            .field("top_k", &self.top_k)
            .field("embedder", &self.embedder.model_name())
            .field("answerer", &self.answerer.model_name())
            .finish_non_exhaustive()
    }
}

/// The size with the highest combined score; the first wins ties.
///
/// # Errors
///
/// Returns [`EvaluationError::NoResults`] for an empty sweep.
pub fn best_size(results: &[SweepResult]) -> Result<&SweepResult> {
    best_index(results.iter().map(SweepResult::combined))
        .map(|i| &results[i])
        .ok_or_else(|| EvaluationError::NoResults.into())
}
