//! Embedding generation for semantic chunking and vector retrieval.
//!
//! Provides OpenAI embeddings (`text-embedding-3-small`) and a hash-based
//! fallback that produces deterministic pseudo-embeddings offline.

mod hash;
mod openai;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default dimensions of the hash embedder.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Default OpenAI embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Trait for embedding generators.
///
/// Implementations must be thread-safe (`Send + Sync`) so strategies running
/// concurrently can share one embedder.
///
/// # Examples
///
/// ```
/// use chunkbench::embedding::{Embedder, HashEmbedder, DEFAULT_DIMENSIONS};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let embedder = HashEmbedder::new(DEFAULT_DIMENSIONS);
/// let embedding = embedder.embed("Hello, world!").await.unwrap();
/// assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
/// # }
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Returns the model identifier.
    fn model_name(&self) -> &str;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts, in input order.
    ///
    /// The default implementation calls `embed` for each text sequentially.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails for any text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Which embedder backs a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// OpenAI embeddings API.
    #[default]
    OpenAi,
    /// Offline hash embeddings.
    Hash,
}

/// Creates an embedder.
///
/// # Errors
///
/// Returns [`Error::Config`] when an OpenAI embedder is requested without an
/// API key.
pub fn create_embedder(
    kind: EmbedderKind,
    api_key: Option<&str>,
    model: &str,
) -> Result<Arc<dyn Embedder>> {
    match kind {
        EmbedderKind::Hash => Ok(Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS))),
        EmbedderKind::OpenAi => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| Error::config("OPENAI_API_KEY is required for OpenAI embeddings"))?;
            Ok(Arc::new(OpenAiEmbedder::new(key, model)))
        }
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical), or 0.0 if
/// the vectors have different lengths or zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_guards() {
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn test_create_embedder_hash() {
        let embedder = create_embedder(EmbedderKind::Hash, None, DEFAULT_EMBEDDING_MODEL).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_create_embedder_openai_requires_key() {
        let err = create_embedder(EmbedderKind::OpenAi, None, DEFAULT_EMBEDDING_MODEL)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config { .. }));

        let err = create_embedder(EmbedderKind::OpenAi, Some("  "), DEFAULT_EMBEDDING_MODEL)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_embedder_kind_serde() {
        let kind: EmbedderKind = serde_json::from_str("\"hash\"").unwrap();
        assert_eq!(kind, EmbedderKind::Hash);
        let kind: EmbedderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, EmbedderKind::OpenAi);
    }

    #[tokio::test]
    async fn test_embed_batch_matches_embed() {
        let embedder = create_embedder(EmbedderKind::Hash, None, DEFAULT_EMBEDDING_MODEL).unwrap();
        let texts = vec!["hello".to_string(), "world".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], embedder.embed("hello").await.unwrap());
    }
}
