//! Side-by-side comparison of configured strategies.
//!
//! Strategies run concurrently over the same input unless runs are isolated,
//! in which case each finishes before the next starts. A failing strategy
//! keeps its row, carrying the error message instead of metrics.

use crate::analysis::{Clock, SystemClock};
use crate::chunking::{
    ChunkProcessor, ChunkerResult, NamedStrategy, StrategyContext, create_strategy,
};
use crate::core::PerformanceReport;
use crate::error::{EvaluationError, Result};
use crate::evaluation::evaluator::ChunkingEvaluator;
use crate::evaluation::score::{STRATEGY_WEIGHTS, best_index};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;

/// Judge scores of one strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScores {
    /// Chunking plus judging time, in seconds.
    pub elapsed_s: f64,
    /// Average faithfulness.
    pub faithfulness: f64,
    /// Average relevancy.
    pub relevancy: f64,
}

impl QualityScores {
    /// Combined ranking score with the strategy weights.
    #[must_use]
    pub fn combined(&self) -> f64 {
        STRATEGY_WEIGHTS.combine(self.elapsed_s, self.faithfulness, self.relevancy)
    }
}

/// Metrics of a successful row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowMetrics {
    /// Performance report of the run.
    pub report: PerformanceReport,
    /// Present when the row was judged.
    pub scores: Option<QualityScores>,
}

/// One strategy's row in a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Strategy display name.
    pub name: String,
    /// Metrics, or the error message of a failed run.
    pub outcome: std::result::Result<RowMetrics, String>,
}

impl ComparisonRow {
    /// The row's metrics if it succeeded.
    #[must_use]
    pub fn metrics(&self) -> Option<&RowMetrics> {
        self.outcome.as_ref().ok()
    }
}

/// Runs configured strategies over one input.
pub struct EvaluationDriver {
    strategies: Vec<NamedStrategy>,
    context: StrategyContext,
    processor: ChunkProcessor,
    clock: Arc<dyn Clock>,
    isolated: bool,
}

impl EvaluationDriver {
    /// Creates a driver; strategies are built from `context` at run time.
    #[must_use]
    pub fn new(strategies: Vec<NamedStrategy>, context: StrategyContext) -> Self {
        let processor = ChunkProcessor::new(Arc::clone(&context.counter));
        Self {
            strategies,
            context,
            processor,
            clock: Arc::new(SystemClock::new()),
            isolated: false,
        }
    }

    /// Replaces the processor used for chunking runs.
    #[must_use]
    pub fn with_processor(mut self, processor: ChunkProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Replaces the clock timing evaluated runs.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs strategies one at a time when `isolated` is set.
    ///
    /// Memory deltas are sampled process-wide; isolated runs keep one
    /// strategy's allocations out of another's report.
    #[must_use]
    pub fn with_isolated_runs(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    /// Configured strategies, in order.
    #[must_use]
    pub fn strategies(&self) -> &[NamedStrategy] {
        &self.strategies
    }

    /// Runs every strategy; one row per strategy in configuration order.
    pub async fn compare(&self, text: &str) -> Vec<ComparisonRow> {
        self.rows(text, None).await
    }

    /// Like [`compare`](Self::compare), then judges every row's chunks.
    pub async fn evaluate(&self, text: &str, evaluator: &ChunkingEvaluator) -> Vec<ComparisonRow> {
        self.rows(text, Some(evaluator)).await
    }

    async fn rows(&self, text: &str, evaluator: Option<&ChunkingEvaluator>) -> Vec<ComparisonRow> {
        if !self.isolated {
            return join_all(
                self.strategies
                    .iter()
                    .map(|entry| self.row(entry, text, evaluator)),
            )
            .await;
        }
        let mut rows = Vec::with_capacity(self.strategies.len());
        for entry in &self.strategies {
            rows.push(self.row(entry, text, evaluator).await);
        }
        rows
    }

    async fn row(
        &self,
        entry: &NamedStrategy,
        text: &str,
        evaluator: Option<&ChunkingEvaluator>,
    ) -> ComparisonRow {
        let name = entry.display_name();
        let outcome = self.measure(entry, text, evaluator).await.map_err(|err| {
            tracing::warn!(strategy = %name, error = %err, "strategy row failed");
            err.to_string()
        });
        ComparisonRow { name, outcome }
    }

    async fn measure(
        &self,
        entry: &NamedStrategy,
        text: &str,
        evaluator: Option<&ChunkingEvaluator>,
    ) -> Result<RowMetrics> {
        let started_ms = self.clock.now_ms();
        let strategy = create_strategy(entry, &self.context)?;
        let ChunkerResult { chunks, report } = self.processor.process(&strategy, text).await?;

        let scores = match evaluator {
            None => None,
            Some(evaluator) => {
                let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
                let faithfulness = evaluator.evaluate_faithfulness(&contents).await?;
                let relevancy = evaluator.evaluate_relevancy(&contents).await?;
                Some(QualityScores {
                    elapsed_s: (self.clock.now_ms() - started_ms).max(0.0) / 1000.0,
                    faithfulness,
                    relevancy,
                })
            }
        };

        Ok(RowMetrics { report, scores })
    }
}

impl std::fmt::Debug for EvaluationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationDriver")
            .field("strategies", &self.strategies.len())
            .field("context", &self.context)
            .field("isolated", &self.isolated)
            .finish_non_exhaustive()
    }
}

/// The judged row with the highest combined score; the first wins ties.
///
/// # Errors
///
/// Returns [`EvaluationError::NoResults`] when no row was judged.
pub fn best_strategy(rows: &[ComparisonRow]) -> Result<&ComparisonRow> {
    let judged: Vec<(&ComparisonRow, QualityScores)> = rows
        .iter()
        .filter_map(|row| row.metrics().and_then(|m| m.scores).map(|s| (row, s)))
        .collect();
    best_index(judged.iter().map(|(_, s)| s.combined()))
        .map(|i| judged[i].0)
        .ok_or_else(|| EvaluationError::NoResults.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FixedMemory, MemoryProbe, StepClock};
    use crate::chunking::{BasicOptions, SemanticOptions, SplitMethod, StrategyConfig};
    use crate::embedding::{Embedder, HashEmbedder};
    use crate::evaluation::judge::ResponseEvaluator;
    use crate::evaluation::testing::ScriptedModel;
    use crate::tokenizer::WhitespaceCounter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Reports 1000 more bytes on every sample.
    #[derive(Default)]
    struct GrowingMemory(AtomicU64);

    impl MemoryProbe for GrowingMemory {
        fn resident_bytes(&self) -> u64 {
            self.0.fetch_add(1000, Ordering::SeqCst) + 1000
        }
    }

    /// Yields to the executor before every embedding.
    struct YieldingEmbedder(HashEmbedder);

    #[async_trait]
    impl Embedder for YieldingEmbedder {
        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn model_name(&self) -> &str {
            self.0.model_name()
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            tokio::task::yield_now().await;
            self.0.embed(text).await
        }
    }

    fn basic(name: &str, chunk_size: usize, chunk_overlap: usize) -> NamedStrategy {
        NamedStrategy::new(
            name,
            StrategyConfig::Basic(BasicOptions {
                chunk_size,
                chunk_overlap,
                method: SplitMethod::Word,
            }),
        )
    }

    fn driver(strategies: Vec<NamedStrategy>) -> EvaluationDriver {
        let counter = Arc::new(WhitespaceCounter);
        let processor = ChunkProcessor::with_probes(
            counter.clone(),
            Arc::new(StepClock::new(1.0)),
            Arc::new(FixedMemory(0)),
        );
        EvaluationDriver::new(strategies, StrategyContext::new(counter))
            .with_processor(processor)
            .with_clock(Arc::new(StepClock::new(500.0)))
    }

    const TEXT: &str = "one two three four five six seven eight";

    #[tokio::test]
    async fn test_compare_keeps_config_order() {
        let rows = driver(vec![basic("Fours", 4, 0), basic("Twos", 2, 0)])
            .compare(TEXT)
            .await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Fours");
        assert_eq!(rows[0].metrics().unwrap().report.chunks_created, 2);
        assert_eq!(rows[1].metrics().unwrap().report.chunks_created, 4);
        assert!(rows[0].metrics().unwrap().scores.is_none());
    }

    #[tokio::test]
    async fn test_failed_strategy_keeps_row() {
        let rows = driver(vec![basic("Broken", 4, 4), basic("Fine", 4, 0)])
            .compare(TEXT)
            .await;
        assert_eq!(rows.len(), 2);
        let err = rows[0].outcome.as_ref().unwrap_err();
        assert!(err.contains("overlap"));
        assert!(rows[1].metrics().is_some());
    }

    #[tokio::test]
    async fn test_semantic_without_embedder_fails_its_row_only() {
        let semantic = NamedStrategy::unnamed(StrategyConfig::Semantic(SemanticOptions::default()));
        let rows = driver(vec![semantic, basic("Fine", 4, 0)]).compare(TEXT).await;
        assert_eq!(rows[0].name, "Semantic");
        assert!(rows[0].outcome.is_err());
        assert!(rows[1].outcome.is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_and_rank() {
        let model = ScriptedModel::new(|prompt| {
            let score = if prompt.contains("one two three four five six seven eight") {
                1.0
            } else {
                0.25
            };
            Some(format!(r#"{{"passing": true, "score": {score}}}"#))
        });
        let evaluator = ChunkingEvaluator::new(ResponseEvaluator::new(Arc::new(model)));
        let rows = driver(vec![basic("Small", 2, 0), basic("Whole", 8, 0)])
            .evaluate(TEXT, &evaluator)
            .await;

        let small = rows[0].metrics().unwrap().scores.unwrap();
        let whole = rows[1].metrics().unwrap().scores.unwrap();
        assert!((small.faithfulness - 0.25).abs() < 1e-12);
        assert!((whole.relevancy - 1.0).abs() < 1e-12);
        assert!(whole.elapsed_s > 0.0);

        assert_eq!(best_strategy(&rows).unwrap().name, "Whole");
    }

    async fn memory_deltas(isolated: bool) -> Vec<i64> {
        let counter = Arc::new(WhitespaceCounter);
        let processor = ChunkProcessor::with_probes(
            counter.clone(),
            Arc::new(StepClock::new(1.0)),
            Arc::new(GrowingMemory::default()),
        );
        let context = StrategyContext::new(counter)
            .with_embedder(Arc::new(YieldingEmbedder(HashEmbedder::new(16))));
        let semantic = NamedStrategy::new(
            "Semantic",
            StrategyConfig::Semantic(SemanticOptions {
                chunk_size: 10,
                chunk_overlap: 0,
                similarity_threshold: 0.99,
            }),
        );
        let driver = EvaluationDriver::new(vec![semantic, basic("Fours", 4, 0)], context)
            .with_processor(processor)
            .with_isolated_runs(isolated);
        driver
            .compare(TEXT)
            .await
            .iter()
            .map(|row| row.metrics().unwrap().report.memory_delta_bytes)
            .collect()
    }

    #[tokio::test]
    async fn test_isolated_runs_keep_memory_deltas_apart() {
        assert_eq!(memory_deltas(true).await, vec![1000, 1000]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_memory_samples() {
        let deltas = memory_deltas(false).await;
        assert_eq!(deltas[1], 1000);
        assert!(deltas[0] > 1000, "semantic delta {deltas:?}");
    }

    #[tokio::test]
    async fn test_isolated_rows_match_concurrent_rows() {
        let concurrent = driver(vec![basic("Fours", 4, 0), basic("Twos", 2, 0)])
            .compare(TEXT)
            .await;
        let isolated = driver(vec![basic("Fours", 4, 0), basic("Twos", 2, 0)])
            .with_isolated_runs(true)
            .compare(TEXT)
            .await;
        assert_eq!(concurrent, isolated);
    }

    #[test]
    fn test_best_strategy_without_scores() {
        let rows = vec![ComparisonRow {
            name: "x".to_string(),
            outcome: Err("failed".to_string()),
        }];
        assert!(matches!(
            best_strategy(&rows),
            Err(crate::Error::Evaluation(EvaluationError::NoResults))
        ));
    }
}
