//! Document store and hybrid retrieval.
//!
//! Chunks are indexed as [`ChunkRecord`]s (content, embedding, TF-IDF
//! weights) in a `SQLite` database with an FTS5 index. [`HybridRetriever`]
//! fuses BM25 and cosine rankings into a context string.

pub mod record;
pub mod retriever;
pub mod schema;
pub mod sqlite;
pub mod tfidf;
pub mod traits;

pub use record::{ChunkRecord, ScoredRow};
pub use retriever::{CONTEXT_DELIMITER, DEFAULT_TOP_K, HybridRetriever, build_records};
pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use tfidf::TfIdf;
pub use traits::ChunkStore;

/// Default database path relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".chunkbench/index.db";
