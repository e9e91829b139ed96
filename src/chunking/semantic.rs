//! Embedding-driven chunk merging.
//!
//! Text is first split recursively by characters. Each piece is embedded and
//! adjacent pieces whose embeddings are at least `similarity_threshold`
//! apart (cosine) are merged; a merged chunk is re-embedded before it is
//! compared with the next piece.

use crate::chunking::config::SemanticOptions;
use crate::chunking::splitter::recursive_splitter;
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::embedding::{Embedder, cosine_similarity};
use crate::error::{ChunkingError, ExternalError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use text_splitter::{Characters, TextSplitter};

/// Semantic chunker.
///
/// Boundaries depend on the embedder, so output is not guaranteed to be
/// reproducible. The number of texts embedded by the most recent call is
/// kept per instance and reported as the split's external calls.
pub struct SemanticChunker {
    name: String,
    options: SemanticOptions,
    splitter: TextSplitter<Characters>,
    embedder: Arc<dyn Embedder>,
    last_calls: AtomicUsize,
}

impl SemanticChunker {
    /// Creates a semantic chunker.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid size/overlap pair or a
    /// threshold outside `[-1, 1]`.
    pub fn new(name: &str, options: &SemanticOptions, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if !(-1.0..=1.0).contains(&options.similarity_threshold) {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "similarity_threshold {} is outside [-1, 1]",
                    options.similarity_threshold
                ),
            }
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            splitter: recursive_splitter(options.chunk_size, options.chunk_overlap)?,
            embedder,
            last_calls: AtomicUsize::new(0),
        })
    }

    /// Texts embedded by the most recent split.
    #[must_use]
    pub fn last_call_count(&self) -> usize {
        self.last_calls.load(Ordering::Relaxed)
    }

    async fn merge(&self, pieces: Vec<String>, calls: &mut usize) -> Result<Vec<String>> {
        if pieces.len() <= 1 {
            return Ok(pieces);
        }

        let embeddings = self.embedder.embed_batch(&pieces).await?;
        *calls += pieces.len();
        if embeddings.len() != pieces.len() {
            return Err(ExternalError::Embedding(format!(
                "expected {} embeddings, received {}",
                pieces.len(),
                embeddings.len()
            ))
            .into());
        }

        let mut merged = Vec::new();
        let mut pieces = pieces.into_iter().zip(embeddings);
        let Some((mut current, mut current_embedding)) = pieces.next() else {
            return Ok(merged);
        };

        for (piece, embedding) in pieces {
            let similarity = cosine_similarity(&current_embedding, &embedding);
            if similarity >= self.options.similarity_threshold {
                current.push(' ');
                current.push_str(&piece);
                current_embedding = self.embedder.embed(&current).await?;
                *calls += 1;
            } else {
                merged.push(std::mem::replace(&mut current, piece));
                current_embedding = embedding;
            }
        }
        merged.push(current);
        Ok(merged)
    }
}

#[async_trait]
impl ChunkingStrategy for SemanticChunker {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        self.last_calls.store(0, Ordering::Relaxed);
        let pieces: Vec<String> = self.splitter.chunks(text).map(str::to_string).collect();

        let mut calls = 0;
        let result = self.merge(pieces, &mut calls).await;
        self.last_calls.store(calls, Ordering::Relaxed);
        tracing::debug!(strategy = %self.name, calls, "semantic merge finished");

        Ok(SplitOutput {
            pieces: result?,
            external_calls: Some(calls),
        })
    }
}

impl std::fmt::Debug for SemanticChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticChunker")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("embedder", &self.embedder.model_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;

    /// Embeds by topic keyword so merge decisions are predictable.
    struct TopicEmbedder;

    #[async_trait]
    impl Embedder for TopicEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "topic"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("cat") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            })
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn dimensions(&self) -> usize {
            1
        }

        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ExternalError::Embedding("service unavailable".to_string()).into())
        }
    }

    fn options(chunk_size: usize) -> SemanticOptions {
        SemanticOptions {
            chunk_size,
            chunk_overlap: 0,
            similarity_threshold: 0.8,
        }
    }

    #[tokio::test]
    async fn test_merges_similar_neighbours() {
        let chunker = SemanticChunker::new("s", &options(12), Arc::new(TopicEmbedder)).unwrap();
        let text = "cat one.\n\ncat two.\n\ndog one.\n\ndog two.";
        let output = chunker.split(text).await.unwrap();
        assert_eq!(output.pieces, vec!["cat one. cat two.", "dog one. dog two."]);
        // 4 initial embeddings plus 2 re-embeddings
        assert_eq!(output.external_calls, Some(6));
        assert_eq!(chunker.last_call_count(), 6);
    }

    #[tokio::test]
    async fn test_counter_resets_each_call() {
        let chunker = SemanticChunker::new("s", &options(12), Arc::new(TopicEmbedder)).unwrap();
        chunker.split("cat one.\n\ndog one.").await.unwrap();
        assert_eq!(chunker.last_call_count(), 2);
        let output = chunker.split("single piece").await.unwrap();
        assert_eq!(output.external_calls, Some(0));
        assert_eq!(chunker.last_call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedder_failure_propagates() {
        let chunker = SemanticChunker::new("s", &options(12), Arc::new(FailingEmbedder)).unwrap();
        let err = chunker.split("cat one.\n\ndog one.").await.unwrap_err();
        assert!(matches!(err, crate::Error::External(ExternalError::Embedding(_))));
    }

    #[test]
    fn test_not_deterministic() {
        let chunker = SemanticChunker::new("s", &options(100), Arc::new(HashEmbedder::new(16))).unwrap();
        assert!(!chunker.is_deterministic());
    }

    #[test]
    fn test_threshold_validated() {
        let bad = SemanticOptions {
            similarity_threshold: 1.5,
            ..SemanticOptions::default()
        };
        assert!(SemanticChunker::new("s", &bad, Arc::new(HashEmbedder::new(16))).is_err());
    }
}
