//! Scripted language model for unit tests.

use crate::error::{ExternalError, Result};
use crate::evaluation::model::LanguageModel;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Answers prompts with a closure and records every prompt it sees.
/// A `None` from the closure is reported as an API failure.
pub struct ScriptedModel {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(respond: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Some(reply.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| None)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt).ok_or_else(|| ExternalError::Api("scripted failure".to_string()).into())
    }
}
