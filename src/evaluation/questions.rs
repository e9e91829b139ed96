//! Evaluation question generation.

use crate::error::{EvaluationError, Result};
use crate::evaluation::judge::strip_code_fence;
use crate::evaluation::model::LanguageModel;
use crate::evaluation::prompt::build_questions_prompt;
use std::sync::Arc;

/// Default number of generated questions.
pub const DEFAULT_QUESTION_COUNT: usize = 20;

/// Asks a language model for questions answerable from a text.
#[derive(Clone)]
pub struct QuestionGenerator {
    model: Arc<dyn LanguageModel>,
}

impl QuestionGenerator {
    /// Creates a generator backed by `model`.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Generates up to `count` questions about `text`.
    ///
    /// A JSON array with exactly `count` strings is used as is. Anything
    /// else falls back to the reply's lines ending in `?`, first `count`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::NoQuestions`] when the reply holds no
    /// question, or the model error if the call fails.
    pub async fn generate(&self, text: &str, count: usize) -> Result<Vec<String>> {
        let reply = self.model.complete(&build_questions_prompt(text, count)).await?;
        parse_questions(&reply, count)
    }
}

impl std::fmt::Debug for QuestionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionGenerator")
            .field("model", &self.model.model_name())
            .finish()
    }
}

fn parse_questions(reply: &str, count: usize) -> Result<Vec<String>> {
    match serde_json::from_str::<Vec<String>>(strip_code_fence(reply)) {
        Ok(questions) if questions.len() == count => return Ok(questions),
        Ok(questions) => {
            tracing::warn!(expected = count, received = questions.len(), "question count mismatch");
        }
        Err(err) => tracing::warn!(error = %err, "question reply is not a JSON array"),
    }

    let questions: Vec<String> = reply
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with('?'))
        .take(count)
        .map(ToString::to_string)
        .collect();

    if questions.is_empty() {
        return Err(EvaluationError::NoQuestions.into());
    }
    Ok(questions)
}
