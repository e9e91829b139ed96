//! OpenAI embeddings via `async-openai`.

use crate::Result;
use crate::embedding::Embedder;
use crate::error::ExternalError;
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;

/// Dimensions of `text-embedding-3-small`.
const SMALL_MODEL_DIMENSIONS: usize = 1536;

/// Embedder backed by the OpenAI embeddings endpoint.
///
/// Errors are reported as [`ExternalError`] and never retried.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder for `model` using `api_key`.
    #[must_use]
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        SMALL_MODEL_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| ExternalError::Embedding("empty embeddings response".to_string()).into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()?;
        let response = self.client.embeddings().create(request).await?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(ExternalError::Embedding(format!(
                "expected {} embeddings, received {}",
                texts.len(),
                data.len()
            ))
            .into());
        }
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}
