//! Stored chunk records and search hits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Record identifier, `chunk_{index}`.
    pub id: String,
    /// Chunk text.
    pub content: String,
    /// Dense embedding of the content.
    pub embedding: Vec<f32>,
    /// TF-IDF weight per term.
    pub tfidf: BTreeMap<String, f64>,
}

impl ChunkRecord {
    /// Identifier for the chunk at `index`.
    #[must_use]
    pub fn id_for(index: usize) -> String {
        format!("chunk_{index}")
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    /// Record identifier.
    pub id: String,
    /// Record content.
    pub content: String,
    /// Backend-specific score, higher is better.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        assert_eq!(ChunkRecord::id_for(0), "chunk_0");
        assert_eq!(ChunkRecord::id_for(17), "chunk_17");
    }
}
