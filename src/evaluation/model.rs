//! Language model seam for judging, question generation and answering.

use crate::error::{ExternalError, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;

/// Default judge model.
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4";

/// Default model answering sweep questions.
pub const DEFAULT_QUERY_MODEL: &str = "gpt-3.5-turbo";

/// A text-completion model.
///
/// Implementations must be `Send + Sync` so one model can serve concurrent
/// judge calls.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier.
    fn model_name(&self) -> &str;

    /// Completes `prompt` and returns the response text.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalError::Api`] if the request fails.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat-completion model on the OpenAI API, sampled at temperature 0.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiModel {
    /// Creates a client for `model` using `api_key`.
    #[must_use]
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature: 0.0,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages([message.into()])
            .build()?;

        let response = self.client.chat().create(request).await?;
        tracing::debug!(model = %self.model, usage = ?response.usage, "completion received");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExternalError::Api("completion returned no content".to_string()).into())
    }
}
