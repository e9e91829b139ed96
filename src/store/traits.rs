//! Chunk store trait definition.

use crate::error::Result;
use crate::store::record::{ChunkRecord, ScoredRow};

/// Trait for chunk record backends.
///
/// Each method is one logical operation and is atomic: it either applies
/// completely or not at all.
pub trait ChunkStore: Send + Sync {
    /// Writes records, replacing any with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn write_records(&self, records: &[ChunkRecord]) -> Result<()>;

    /// Retrieves a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or deserialization fails.
    fn get_record(&self, id: &str) -> Result<Option<ChunkRecord>>;

    /// Full-text search; best `top_k` by BM25, highest score first.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    fn search_fulltext(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRow>>;

    /// Vector search; best `top_k` by cosine similarity, highest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    fn search_vector(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRow>>;

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the count fails.
    fn record_count(&self) -> Result<usize>;

    /// Deletes every record, keeping the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn clear(&self) -> Result<()>;
}
