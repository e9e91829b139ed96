//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::store::DEFAULT_DB_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chunkbench: benchmark and evaluate text-chunking strategies.
///
/// Runs chunking strategies over a document, reports size, overlap and
/// density statistics, scores chunks with an LLM judge, and indexes chunks
/// for hybrid retrieval.
#[derive(Parser, Debug)]
#[command(name = "chunkbench")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a JSON configuration file.
    #[arg(short, long, env = "CHUNKBENCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// OpenAI API key for judging and OpenAI embeddings.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Embedder (openai, hash); defaults to openai when an API key is set.
    #[arg(long, global = true)]
    pub embedder: Option<String>,

    /// Path to the index database.
    ///
    /// Defaults to `.chunkbench/index.db` in the current directory.
    #[arg(long = "db", env = "CHUNKBENCH_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available strategy types.
    Strategies,

    /// Run the configured strategies and print a comparison table.
    Compare {
        /// Input text file or corpus directory.
        file: PathBuf,
    },

    /// Run one strategy and show its report and sample chunks.
    Run {
        /// Strategy type (see `strategies`).
        strategy: String,

        /// Input text file or corpus directory.
        file: PathBuf,

        /// Chunk size (tokens or characters, per strategy).
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap between chunks.
        #[arg(long)]
        overlap: Option<usize>,

        /// Split method for the basic strategy (character, word, sentence, paragraph).
        #[arg(long)]
        method: Option<String>,

        /// Splitter for the splitter strategy (recursive, token, character, markdown).
        #[arg(long)]
        splitter: Option<String>,

        /// Number of sample chunks to show.
        #[arg(long, default_value = "3")]
        samples: usize,

        /// Maximum characters shown per sample.
        #[arg(long, default_value = "200")]
        preview_len: usize,
    },

    /// Compare strategies and score their chunks with an LLM judge.
    Evaluate {
        /// Input text file or corpus directory.
        file: PathBuf,
    },

    /// Answer generated questions at several chunk sizes.
    Sweep {
        /// Input text file or corpus directory.
        file: PathBuf,

        /// Chunk sizes in tokens, comma separated.
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<usize>,

        /// Number of questions to generate.
        #[arg(long)]
        questions: Option<usize>,
    },

    /// Preprocess, chunk and index a file for hybrid search.
    Index {
        /// Input text file or corpus directory.
        file: PathBuf,
    },

    /// Hybrid (full-text + vector) search over the index.
    Search {
        /// Search query.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    /// The API key, if set and not blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli::parse_from(["chunkbench", "strategies"]);
        if std::env::var_os("CHUNKBENCH_DB_PATH").is_none() {
            assert_eq!(cli.get_db_path(), PathBuf::from(DEFAULT_DB_PATH));
        }
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "chunkbench",
            "--format",
            "json",
            "run",
            "basic",
            "input.txt",
            "--chunk-size",
            "64",
            "--method",
            "word",
        ]);
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Run {
                strategy,
                chunk_size,
                method,
                samples,
                ..
            } => {
                assert_eq!(strategy, "basic");
                assert_eq!(chunk_size, Some(64));
                assert_eq!(method.as_deref(), Some("word"));
                assert_eq!(samples, 3);
            }
            other => unreachable!("parsed {other:?}"),
        }
    }

    #[test]
    fn test_sweep_sizes_comma_separated() {
        let cli = Cli::parse_from(["chunkbench", "sweep", "in.txt", "--sizes", "64,128"]);
        assert!(matches!(cli.command, Commands::Sweep { ref sizes, .. } if sizes == &[64, 128]));
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let mut cli = Cli::parse_from(["chunkbench", "strategies"]);
        cli.api_key = Some("  ".to_string());
        assert!(cli.api_key().is_none());
    }
}
