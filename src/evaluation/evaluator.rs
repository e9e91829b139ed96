//! Average judge scores over a chunk sequence.

use crate::error::Result;
use crate::evaluation::judge::{Criterion, JudgeVerdict, QueryResponse, ResponseEvaluator};
use crate::evaluation::prompt::CHUNK_RELEVANCY_QUERY;
use futures_util::stream::{self, StreamExt, TryStreamExt};

/// Default number of judge calls in flight.
pub const DEFAULT_JUDGE_CONCURRENCY: usize = 4;

/// Scores chunks with a [`ResponseEvaluator`], each chunk judged against
/// itself as its only source.
#[derive(Debug, Clone)]
pub struct ChunkingEvaluator {
    judge: ResponseEvaluator,
    concurrency: usize,
}

impl ChunkingEvaluator {
    /// Creates an evaluator running up to [`DEFAULT_JUDGE_CONCURRENCY`]
    /// judge calls at once.
    #[must_use]
    pub const fn new(judge: ResponseEvaluator) -> Self {
        Self {
            judge,
            concurrency: DEFAULT_JUDGE_CONCURRENCY,
        }
    }

    /// Sets the number of concurrent judge calls (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The judge in use.
    #[must_use]
    pub const fn judge(&self) -> &ResponseEvaluator {
        &self.judge
    }

    /// Average faithfulness score, 0 for no chunks.
    ///
    /// # Errors
    ///
    /// Returns the first model failure.
    pub async fn evaluate_faithfulness<S: AsRef<str> + Sync>(&self, chunks: &[S]) -> Result<f64> {
        self.average(Criterion::Faithfulness, chunks).await
    }

    /// Average relevancy score against a fixed summary query, 0 for no
    /// chunks.
    ///
    /// # Errors
    ///
    /// Returns the first model failure.
    pub async fn evaluate_relevancy<S: AsRef<str> + Sync>(&self, chunks: &[S]) -> Result<f64> {
        self.average(Criterion::Relevancy, chunks).await
    }

    async fn average<S: AsRef<str> + Sync>(&self, criterion: Criterion, chunks: &[S]) -> Result<f64> {
        if chunks.is_empty() {
            return Ok(0.0);
        }

        let verdicts: Vec<JudgeVerdict> = stream::iter(chunks)
            .map(|chunk| {
                let response = QueryResponse::self_sourced(chunk.as_ref());
                async move {
                    self.judge
                        .evaluate(criterion, CHUNK_RELEVANCY_QUERY, &response)
                        .await
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(mean(verdicts.iter().map(|v| v.score)))
    }
}

/// Arithmetic mean, 0 for an empty iterator.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
