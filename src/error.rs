//! Error types for chunkbench operations.
//!
//! This module provides the error hierarchy using `thiserror` for chunking,
//! statistics, evaluation, external services, storage, I/O, and CLI commands.

use thiserror::Error;

/// Result type alias for chunkbench operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking-related errors (strategy construction and execution).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Statistics computation errors (invalid numeric configuration).
    #[error("statistics error: {0}")]
    Statistics(#[from] StatisticsError),

    /// Evaluation errors (judge, question generation, ranking).
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// External service failures (LLM API, embeddings, tokenizer).
    #[error("external service failed: {0}")]
    External(#[from] ExternalError),

    /// Document store errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Missing or invalid configuration (API key, config file).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// A strategy failed while splitting its input.
    #[error("strategy '{strategy}' failed on {input_len} bytes of input: {reason}")]
    Failed {
        /// Name of the strategy that failed.
        strategy: String,
        /// Length of the input text in bytes.
        input_len: usize,
        /// Underlying cause.
        reason: String,
    },

    /// Invalid strategy configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),

    /// Unknown chunking strategy.
    #[error("unknown chunking strategy: {name}")]
    UnknownStrategy {
        /// Name of the unknown strategy.
        name: String,
    },
}

/// Statistics engine errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatisticsError {
    /// Overlap ratio requested against a zero target chunk size.
    #[error("target chunk size must be greater than zero to compute an overlap ratio")]
    ZeroTargetChunkSize,
}

/// Evaluation errors.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Judge response was not the expected JSON verdict.
    #[error("{criterion} judge response could not be parsed: {reason}")]
    JudgeParseFailed {
        /// Criterion being judged.
        criterion: String,
        /// Parser message.
        reason: String,
    },

    /// Question generation produced nothing usable.
    #[error("could not generate any valid questions")]
    NoQuestions,

    /// Nothing was evaluated.
    #[error("no results to rank")]
    NoResults,
}

/// External collaborator failures. Propagated, never retried.
#[derive(Error, Debug)]
pub enum ExternalError {
    /// LLM API call failed.
    #[error("API request failed: {0}")]
    Api(String),

    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Tokenizer could not be loaded.
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// A corpus directory held no matching documents.
    #[error("no documents found in {path}")]
    NoDocuments {
        /// Directory that was searched.
        path: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl Error {
    /// Builds a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// Implement From traits for library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<regex::Error> for ChunkingError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Chunking(err.into())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for ExternalError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Api(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::External(err.into())
    }
}
