//! LLM-judged evaluation of chunking strategies and chunk sizes.
//!
//! - [`ResponseEvaluator`] scores one response for faithfulness or relevancy
//! - [`ChunkingEvaluator`] averages judge scores over a chunk sequence
//! - [`EvaluationDriver`] compares configured strategies side by side
//! - [`ChunkSizeSweep`] answers generated questions at several chunk sizes
//!
//! Model access goes through the [`LanguageModel`] trait.

pub mod driver;
pub mod evaluator;
pub mod judge;
pub mod model;
pub mod prompt;
pub mod questions;
pub mod score;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{ComparisonRow, EvaluationDriver, QualityScores, RowMetrics, best_strategy};
pub use evaluator::{ChunkingEvaluator, DEFAULT_JUDGE_CONCURRENCY};
pub use judge::{Criterion, JudgeVerdict, QueryResponse, ResponseEvaluator, parse_verdict};
pub use model::{DEFAULT_JUDGE_MODEL, DEFAULT_QUERY_MODEL, LanguageModel, OpenAiModel};
pub use questions::{DEFAULT_QUESTION_COUNT, QuestionGenerator};
pub use score::{STRATEGY_WEIGHTS, SWEEP_WEIGHTS, ScoreWeights};
pub use sweep::{ChunkSizeSweep, DEFAULT_SWEEP_SIZES, SweepResult, best_size};
