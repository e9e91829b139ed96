//! Benchmark configuration.
//!
//! Resolution order:
//! 1. Explicit path (`--config` flag or `CHUNKBENCH_CONFIG`)
//! 2. `<config dir>/chunkbench/config.json`, when present
//! 3. Built-in defaults
//!
//! Missing keys take their defaults and unknown keys are ignored.

use crate::chunking::{NamedStrategy, default_strategies};
use crate::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::error::{Error, Result};
use crate::io::CorpusOptions;
use crate::evaluation::{
    DEFAULT_JUDGE_CONCURRENCY, DEFAULT_JUDGE_MODEL, DEFAULT_QUERY_MODEL, DEFAULT_QUESTION_COUNT,
    DEFAULT_SWEEP_SIZES,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the application config directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Application directory name under the platform config directory.
const APP_DIR: &str = "chunkbench";

/// Settings shared by the benchmark commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Strategies compared by `compare` and `evaluate`, in display order.
    pub strategies: Vec<NamedStrategy>,
    /// Model judging responses and writing sweep questions.
    pub judge_model: String,
    /// Model answering sweep questions.
    pub query_model: String,
    /// OpenAI embedding model.
    pub embedding_model: String,
    /// Judge calls in flight per strategy.
    pub judge_concurrency: usize,
    /// Chunk sizes tried by `sweep`.
    pub sweep_sizes: Vec<usize>,
    /// Questions generated by `sweep`.
    pub questions: usize,
    /// How a directory input is read.
    pub corpus: CorpusOptions,
    /// Run compared strategies one at a time so memory deltas are not
    /// shared between them.
    pub isolate_runs: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            query_model: DEFAULT_QUERY_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            judge_concurrency: DEFAULT_JUDGE_CONCURRENCY,
            sweep_sizes: DEFAULT_SWEEP_SIZES.to_vec(),
            questions: DEFAULT_QUESTION_COUNT,
            corpus: CorpusOptions::default(),
            isolate_runs: false,
        }
    }
}

impl BenchConfig {
    /// Resolves and loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an explicit file is missing, or if the
    /// selected file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)
            .map_err(|e| Error::config(format!("invalid config {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), strategies = config.strategies.len(), "config loaded");
        Ok(config)
    }

    /// Parses configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed JSON or mistyped values.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The per-user config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{SplitterKind, StrategyConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.strategies.len(), 7);
        assert_eq!(config.judge_model, "gpt-4");
        assert_eq!(config.sweep_sizes, vec![128, 256, 512, 1024, 2048]);
        assert_eq!(config.questions, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BenchConfig::from_json(r#"{"judge_model": "gpt-4o", "unknown": 1}"#).unwrap();
        assert_eq!(config.judge_model, "gpt-4o");
        assert_eq!(config.strategies.len(), 7);
        assert_eq!(config.judge_concurrency, DEFAULT_JUDGE_CONCURRENCY);
    }

    #[test]
    fn test_strategy_entries() {
        let config = BenchConfig::from_json(
            r#"{"strategies": [
                {"type": "splitter", "name": "MD", "splitter": "markdown", "chunk_size": 300},
                {"type": "sentence"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.strategies.len(), 2);
        assert_eq!(config.strategies[0].display_name(), "MD");
        assert!(matches!(
            &config.strategies[0].config,
            StrategyConfig::Splitter(o) if o.splitter == SplitterKind::Markdown && o.chunk_size == 300
        ));
        assert_eq!(config.strategies[1].display_name(), "Sentence Splitter");
    }

    #[test]
    fn test_corpus_section() {
        let config = BenchConfig::from_json(
            r#"{"corpus": {"extensions": ["rst"], "max_documents": 5}, "isolate_runs": true}"#,
        )
        .unwrap();
        assert_eq!(config.corpus.extensions, vec!["rst"]);
        assert_eq!(config.corpus.max_documents, 5);
        assert!(config.corpus.recursive);
        assert!(config.corpus.exclude_hidden);
        assert!(config.isolate_runs);
        assert_eq!(BenchConfig::default().corpus.max_documents, 20);
    }

    #[test]
    fn test_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"questions": 3}}"#).unwrap();
        let config = BenchConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.questions, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = BenchConfig::load(Some(Path::new("/nonexistent/chunkbench.json"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = BenchConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
