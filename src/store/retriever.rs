//! Hybrid retrieval: full-text and vector search fused with RRF.

use crate::chunking::{PreprocessOptions, TextPreprocessor};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::search::{RankedResult, RrfConfig, weighted_rrf};
use crate::store::record::{ChunkRecord, ScoredRow};
use crate::store::tfidf::TfIdf;
use crate::store::traits::ChunkStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of chunks returned as context.
pub const DEFAULT_TOP_K: usize = 5;

/// Delimiter between chunks in a context string.
pub const CONTEXT_DELIMITER: &str = "\n\n";

/// Embeds chunks and computes their TF-IDF weights.
///
/// Records are numbered `chunk_0`, `chunk_1`, ... in input order.
///
/// # Errors
///
/// Returns an error if embedding fails.
pub async fn build_records(chunks: &[String], embedder: &dyn Embedder) -> Result<Vec<ChunkRecord>> {
    let embeddings = embedder.embed_batch(chunks).await?;
    let tfidf = TfIdf::fit(chunks);

    Ok(chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (content, embedding))| ChunkRecord {
            id: ChunkRecord::id_for(i),
            content: content.clone(),
            embedding,
            tfidf: tfidf.weights(content),
        })
        .collect())
}

/// Combines full-text and vector search over a [`ChunkStore`].
///
/// The query is normalised the same way indexed text is before both
/// searches run.
pub struct HybridRetriever {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    preprocessor: TextPreprocessor,
    rrf: RrfConfig,
    fulltext_weight: f64,
    vector_weight: f64,
}

impl HybridRetriever {
    /// Creates a retriever with equal weights and `k = 60`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query preprocessor cannot be built.
    pub fn new(store: Arc<dyn ChunkStore>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Ok(Self {
            store,
            embedder,
            preprocessor: TextPreprocessor::new("query", &PreprocessOptions::default())?,
            rrf: RrfConfig::default(),
            fulltext_weight: 1.0,
            vector_weight: 1.0,
        })
    }

    /// Sets the per-method fusion weights.
    #[must_use]
    pub const fn with_weights(mut self, fulltext: f64, vector: f64) -> Self {
        self.fulltext_weight = fulltext;
        self.vector_weight = vector;
        self
    }

    /// Sets the RRF configuration.
    #[must_use]
    pub const fn with_rrf(mut self, rrf: RrfConfig) -> Self {
        self.rrf = rrf;
        self
    }

    /// Best `top_k` chunks by fused rank, highest first. Scores are the
    /// fused RRF scores.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or either search fails.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRow>> {
        let cleaned = self.preprocessor.clean(query);
        let query = if cleaned.is_empty() { query.trim() } else { cleaned.as_str() };

        let embedding = self.embedder.embed(query).await?;
        let fulltext = to_ranked(self.store.search_fulltext(query, top_k)?);
        let vector = to_ranked(self.store.search_vector(&embedding, top_k)?);
        tracing::debug!(
            fulltext = fulltext.len(),
            vector = vector.len(),
            "hybrid search candidates"
        );

        let contents: HashMap<&str, &str> = fulltext
            .iter()
            .chain(vector.iter())
            .map(|r| (r.id.as_str(), r.content.as_str()))
            .collect();

        let fused = weighted_rrf(
            &[
                (fulltext.as_slice(), self.fulltext_weight),
                (vector.as_slice(), self.vector_weight),
            ],
            &self.rrf,
        );

        Ok(fused
            .into_iter()
            .take(top_k)
            .filter_map(|hit| {
                contents.get(hit.id.as_str()).map(|content| ScoredRow {
                    content: (*content).to_string(),
                    id: hit.id,
                    score: hit.score,
                })
            })
            .collect())
    }

    /// Context string for `query`: the fused top `top_k` chunk contents
    /// joined by a blank line.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or either search fails.
    pub async fn search_with_context(&self, query: &str, top_k: usize) -> Result<String> {
        let hits = self.search(query, top_k).await?;
        Ok(hits
            .iter()
            .map(|h| h.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER))
    }
}

impl std::fmt::Debug for HybridRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("embedder", &self.embedder.model_name())
            .field("rrf_k", &self.rrf.k)
            .field("fulltext_weight", &self.fulltext_weight)
            .field("vector_weight", &self.vector_weight)
            .finish_non_exhaustive()
    }
}

fn to_ranked(rows: Vec<ScoredRow>) -> Vec<RankedResult> {
    rows.into_iter()
        .map(|row| RankedResult::new(row.id, row.content, row.score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::store::SqliteStore;

    fn corpus() -> Vec<String> {
        vec![
            "rivers carry sediment toward the sea".to_string(),
            "mountains erode under wind and rain".to_string(),
            "sediment settles into river deltas".to_string(),
            "glaciers carve deep valleys".to_string(),
        ]
    }

    async fn retriever() -> HybridRetriever {
        let embedder = Arc::new(HashEmbedder::new(64));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let records = build_records(&corpus(), embedder.as_ref()).await.unwrap();
        store.write_records(&records).unwrap();
        HybridRetriever::new(store, embedder).unwrap()
    }

    #[tokio::test]
    async fn test_build_records() {
        let embedder = HashEmbedder::new(16);
        let records = build_records(&corpus(), &embedder).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].id, "chunk_2");
        assert_eq!(records[2].embedding.len(), 16);
        assert!(records[2].tfidf.contains_key("sediment"));
        assert!(!records[0].tfidf.contains_key("the"));
    }

    #[tokio::test]
    async fn test_hybrid_search_prefers_shared_terms() {
        let r = retriever().await;
        let hits = r.search("Where does the sediment go?", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert!(ids.contains(&"chunk_0"));
        assert!(ids.contains(&"chunk_2"));
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_context_joined() {
        let r = retriever().await;
        let context = r.search_with_context("sediment", 2).await.unwrap();
        assert_eq!(context.split(CONTEXT_DELIMITER).count(), 2);
        assert!(context.contains("sediment"));
    }

    #[tokio::test]
    async fn test_top_k_limits() {
        let r = retriever().await;
        assert_eq!(r.search("valleys", 1).await.unwrap().len(), 1);
        assert!(r.search("valleys", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let r = HybridRetriever::new(store, Arc::new(HashEmbedder::new(8))).unwrap();
        assert_eq!(r.search_with_context("anything", 5).await.unwrap(), "");
    }
}
