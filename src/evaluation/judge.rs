//! LLM-as-judge scoring of responses.
//!
//! A judge verdict that cannot be parsed is never an error for the caller:
//! it is logged and replaced by a failing verdict with score 0.

use crate::error::{EvaluationError, Result};
use crate::evaluation::model::LanguageModel;
use crate::evaluation::prompt::{build_faithfulness_prompt, build_relevancy_prompt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a judge call measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Response is supported by its sources.
    Faithfulness,
    /// Response addresses the query.
    Relevancy,
}

impl Criterion {
    /// Lowercase name used in prompts and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Faithfulness => "faithfulness",
            Self::Relevancy => "relevancy",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response with the source texts it was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Response text.
    pub response: String,
    /// Source context texts.
    pub sources: Vec<String>,
}

impl QueryResponse {
    /// A chunk judged against itself.
    #[must_use]
    pub fn self_sourced(chunk: &str) -> Self {
        Self {
            response: chunk.to_string(),
            sources: vec![chunk.to_string()],
        }
    }
}

/// Judge verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Whether the judge considers the response acceptable.
    #[serde(default)]
    pub passing: bool,
    /// Score in `[0, 1]`.
    pub score: f64,
    /// Judge's explanation.
    #[serde(default)]
    pub feedback: String,
}

impl JudgeVerdict {
    /// The verdict used when the judge's reply cannot be parsed.
    #[must_use]
    pub fn parse_failure(criterion: Criterion) -> Self {
        Self {
            passing: false,
            score: 0.0,
            feedback: format!("Failed to evaluate {criterion} due to parsing error"),
        }
    }
}

/// Parses a judge reply into a verdict with its score clamped to `[0, 1]`.
///
/// Replies wrapped in a Markdown code fence are accepted.
///
/// # Errors
///
/// Returns [`EvaluationError::JudgeParseFailed`] if the reply is not a JSON
/// verdict object.
pub fn parse_verdict(criterion: Criterion, reply: &str) -> std::result::Result<JudgeVerdict, EvaluationError> {
    let mut verdict: JudgeVerdict =
        serde_json::from_str(strip_code_fence(reply)).map_err(|e| EvaluationError::JudgeParseFailed {
            criterion: criterion.to_string(),
            reason: e.to_string(),
        })?;
    verdict.score = if verdict.score.is_finite() {
        verdict.score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Ok(verdict)
}

/// Strips a surrounding Markdown code fence (with optional language tag).
pub(crate) fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Scores responses with a language model.
#[derive(Clone)]
pub struct ResponseEvaluator {
    model: Arc<dyn LanguageModel>,
}

impl ResponseEvaluator {
    /// Creates an evaluator backed by `model`.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Judges `response` for `criterion`. `query` is used by relevancy only.
    ///
    /// # Errors
    ///
    /// Returns an error only if the model call fails; unparseable replies
    /// yield [`JudgeVerdict::parse_failure`].
    pub async fn evaluate(
        &self,
        criterion: Criterion,
        query: &str,
        response: &QueryResponse,
    ) -> Result<JudgeVerdict> {
        let prompt = match criterion {
            Criterion::Faithfulness => build_faithfulness_prompt(&response.response, &response.sources),
            Criterion::Relevancy => build_relevancy_prompt(query, &response.response, &response.sources),
        };
        let reply = self.model.complete(&prompt).await?;

        Ok(parse_verdict(criterion, &reply).unwrap_or_else(|err| {
            tracing::warn!(%criterion, error = %err, "judge reply ignored");
            JudgeVerdict::parse_failure(criterion)
        }))
    }

    /// Judges faithfulness.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    pub async fn faithfulness(&self, response: &QueryResponse) -> Result<JudgeVerdict> {
        self.evaluate(Criterion::Faithfulness, "", response).await
    }

    /// Judges relevancy to `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    pub async fn relevancy(&self, query: &str, response: &QueryResponse) -> Result<JudgeVerdict> {
        self.evaluate(Criterion::Relevancy, query, response).await
    }
}

impl fmt::Debug for ResponseEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEvaluator")
            .field("model", &self.model.model_name())
            .finish()
    }
}
