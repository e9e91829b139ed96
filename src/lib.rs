//! # chunkbench
//!
//! Benchmark and evaluation harness for text-chunking strategies used in
//! retrieval pipelines.
//!
//! chunkbench runs interchangeable chunking strategies over a document,
//! measures each run (time, memory, size distribution, overlap, sentence and
//! word density), scores chunks with an LLM judge, and indexes chunks for
//! hybrid BM25 + vector retrieval.
//!
//! ## Features
//!
//! - **Chunking**: basic, library splitter, sentence, NLP, semantic and
//!   preprocessing strategies behind one trait
//! - **Statistics**: performance reports with overlap and density analysis
//! - **Pipelines**: multi-stage chunking and concurrent batch runs
//! - **Evaluation**: faithfulness/relevancy judging and chunk-size sweeps
//! - **Retrieval**: `SQLite` FTS5 plus cosine search fused with RRF

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod analysis;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod pipeline;
pub mod search;
pub mod store;
pub mod tokenizer;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, ChunkMetadata, PerformanceReport};

// Re-export chunking types
pub use chunking::{
    ChunkProcessor, ChunkerResult, ChunkingStrategy, NamedStrategy, Strategy, StrategyConfig,
    StrategyContext, available_strategies, create_strategy,
};

// Re-export configuration
pub use config::BenchConfig;

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding types
pub use embedding::{
    DEFAULT_DIMENSIONS, Embedder, HashEmbedder, OpenAiEmbedder, cosine_similarity, create_embedder,
};

// Re-export evaluation types
pub use evaluation::{
    ChunkSizeSweep, ChunkingEvaluator, EvaluationDriver, LanguageModel, ResponseEvaluator,
};

// Re-export pipeline and retrieval types
pub use pipeline::Pipeline;
pub use tokenizer::{TiktokenCounter, TokenCounter, WhitespaceCounter};
pub use search::{RankedResult, RrfConfig, reciprocal_rank_fusion, weighted_rrf};
pub use store::{ChunkStore, DEFAULT_DB_PATH, HybridRetriever, SqliteStore};
