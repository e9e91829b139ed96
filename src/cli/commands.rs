//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::chunking::{
    ChunkProcessor, LibrarySplitter, NamedStrategy, PreprocessOptions, STRATEGY_TYPES,
    SplitterKind, SplitterOptions, StrategyConfig, StrategyContext, TextPreprocessor,
    create_strategy, default_config,
};
use crate::cli::output::{
    OutputFormat, format_comparison, format_evaluation, format_index, format_run, format_search,
    format_strategies, format_sweep,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::BenchConfig;
use crate::embedding::{Embedder, EmbedderKind, create_embedder};
use crate::error::{CommandError, Error, Result};
use crate::evaluation::{
    ChunkSizeSweep, ChunkingEvaluator, EvaluationDriver, OpenAiModel, ResponseEvaluator,
    best_size, best_strategy,
};
use crate::io::read_corpus;
use crate::pipeline::Pipeline;
use crate::store::{ChunkStore, HybridRetriever, SqliteStore, build_records};
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Chunk size of the indexing pipeline's splitter, in tokens.
const INDEX_CHUNK_SIZE: usize = 500;

/// Overlap of the indexing pipeline's splitter, in tokens.
const INDEX_OVERLAP: usize = 50;

/// Characters of content shown per search hit.
const SEARCH_PREVIEW_LEN: usize = 160;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Strategies => Ok(format_strategies(&STRATEGY_TYPES, format)),
        Commands::Compare { file } => cmd_compare(cli, file, format).await,
        Commands::Run {
            strategy,
            file,
            chunk_size,
            overlap,
            method,
            splitter,
            samples,
            preview_len,
        } => {
            let overrides = RunOverrides {
                chunk_size: *chunk_size,
                overlap: *overlap,
                method: method.as_deref(),
                splitter: splitter.as_deref(),
            };
            cmd_run(cli, strategy, file, &overrides, *samples, *preview_len, format).await
        }
        Commands::Evaluate { file } => cmd_evaluate(cli, file, format).await,
        Commands::Sweep {
            file,
            sizes,
            questions,
        } => cmd_sweep(cli, file, sizes, *questions, format).await,
        Commands::Index { file } => cmd_index(cli, file, format).await,
        Commands::Search { query, top_k } => cmd_search(cli, query, *top_k, format).await,
    }
}

// ==================== Shared setup ====================

fn load_config(cli: &Cli) -> Result<BenchConfig> {
    BenchConfig::load(cli.config.as_deref())
}

fn token_counter() -> Result<Arc<dyn TokenCounter>> {
    Ok(Arc::new(TiktokenCounter::new()?))
}

fn require_api_key(cli: &Cli) -> Result<&str> {
    cli.api_key()
        .ok_or_else(|| Error::config("OPENAI_API_KEY is required for LLM evaluation"))
}

/// Resolves `--embedder`: explicit choice, else OpenAI with an API key and
/// hash embeddings without one.
fn embedder_kind(cli: &Cli) -> Result<EmbedderKind> {
    match cli.embedder.as_deref() {
        Some(name) => parse_choice(name, "--embedder"),
        None if cli.api_key().is_some() => Ok(EmbedderKind::OpenAi),
        None => Ok(EmbedderKind::Hash),
    }
}

fn embedder(cli: &Cli, config: &BenchConfig) -> Result<Arc<dyn Embedder>> {
    create_embedder(embedder_kind(cli)?, cli.api_key(), &config.embedding_model)
}

fn strategy_context(cli: &Cli, config: &BenchConfig) -> Result<StrategyContext> {
    Ok(StrategyContext::new(token_counter()?).with_embedder(embedder(cli, config)?))
}

/// Parses a lowercase enum value the way configuration files spell it.
fn parse_choice<T: DeserializeOwned>(value: &str, flag: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| CommandError::InvalidArgument(format!("{flag} {value}")).into())
}

// ==================== Command Implementations ====================

async fn cmd_compare(cli: &Cli, file: &Path, format: OutputFormat) -> Result<String> {
    let config = load_config(cli)?;
    let text = read_corpus(file, &config.corpus)?;
    let context = strategy_context(cli, &config)?;
    let driver = EvaluationDriver::new(config.strategies, context)
        .with_isolated_runs(config.isolate_runs);

    tracing::info!(strategies = driver.strategies().len(), bytes = text.len(), "comparing strategies");
    let rows = driver.compare(&text).await;
    Ok(format_comparison(&rows, format))
}

/// Command-line overrides of a strategy's default options.
#[derive(Debug, Default)]
struct RunOverrides<'a> {
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    method: Option<&'a str>,
    splitter: Option<&'a str>,
}

impl RunOverrides<'_> {
    fn apply(&self, config: &mut StrategyConfig) -> Result<()> {
        let (size, overlap) = match config {
            StrategyConfig::Basic(o) => {
                if let Some(method) = self.method {
                    o.method = parse_choice(method, "--method")?;
                }
                (Some(&mut o.chunk_size), Some(&mut o.chunk_overlap))
            }
            StrategyConfig::Splitter(o) => {
                if let Some(splitter) = self.splitter {
                    o.splitter = parse_choice(splitter, "--splitter")?;
                }
                (Some(&mut o.chunk_size), Some(&mut o.chunk_overlap))
            }
            StrategyConfig::Sentence(o) => (Some(&mut o.chunk_size), Some(&mut o.chunk_overlap)),
            StrategyConfig::Nlp(o) => (Some(&mut o.max_chunk_size), Some(&mut o.overlap)),
            StrategyConfig::Semantic(o) => (Some(&mut o.chunk_size), Some(&mut o.chunk_overlap)),
            StrategyConfig::Preprocess(_) => (None, None),
        };
        if let (Some(slot), Some(value)) = (size, self.chunk_size) {
            *slot = value;
        }
        if let (Some(slot), Some(value)) = (overlap, self.overlap) {
            *slot = value;
        }
        Ok(())
    }
}

async fn cmd_run(
    cli: &Cli,
    type_name: &str,
    file: &Path,
    overrides: &RunOverrides<'_>,
    samples: usize,
    preview_len: usize,
    format: OutputFormat,
) -> Result<String> {
    let config = load_config(cli)?;
    let mut strategy_config = default_config(type_name)?;
    overrides.apply(&mut strategy_config)?;
    let entry = NamedStrategy::unnamed(strategy_config);

    let context = strategy_context(cli, &config)?;
    let strategy = create_strategy(&entry, &context)?;
    let text = read_corpus(file, &config.corpus)?;

    let result = ChunkProcessor::new(context.counter)
        .process(&strategy, &text)
        .await?;
    tracing::info!(strategy = %entry.display_name(), chunks = result.chunks.len(), "run complete");
    Ok(format_run(&entry.display_name(), &result, samples, preview_len, format))
}

async fn cmd_evaluate(cli: &Cli, file: &Path, format: OutputFormat) -> Result<String> {
    let config = load_config(cli)?;
    let api_key = require_api_key(cli)?;
    let text = read_corpus(file, &config.corpus)?;

    let judge = Arc::new(OpenAiModel::new(api_key, &config.judge_model));
    let evaluator = ChunkingEvaluator::new(ResponseEvaluator::new(judge))
        .with_concurrency(config.judge_concurrency);
    let context = strategy_context(cli, &config)?;
    let driver = EvaluationDriver::new(config.strategies, context)
        .with_isolated_runs(config.isolate_runs);

    tracing::info!(strategies = driver.strategies().len(), judge = %config.judge_model, "evaluating strategies");
    let rows = driver.evaluate(&text, &evaluator).await;
    let best = best_strategy(&rows).ok();
    Ok(format_evaluation(&rows, best, format))
}

async fn cmd_sweep(
    cli: &Cli,
    file: &Path,
    sizes: &[usize],
    questions: Option<usize>,
    format: OutputFormat,
) -> Result<String> {
    let config = load_config(cli)?;
    let api_key = require_api_key(cli)?;
    let text = read_corpus(file, &config.corpus)?;

    let sizes = if sizes.is_empty() {
        config.sweep_sizes.clone()
    } else {
        sizes.to_vec()
    };
    let sweep = ChunkSizeSweep::new(
        token_counter()?,
        embedder(cli, &config)?,
        Arc::new(OpenAiModel::new(api_key, &config.judge_model)),
        Arc::new(OpenAiModel::new(api_key, &config.query_model)),
    )
    .with_sizes(sizes)
    .with_questions(questions.unwrap_or(config.questions));

    let results = sweep.run(&text).await?;
    let best = best_size(&results).ok();
    Ok(format_sweep(&results, best, format))
}

/// Preprocessing followed by a token splitter.
fn index_pipeline(counter: Arc<dyn TokenCounter>) -> Result<Pipeline> {
    let splitter = SplitterOptions {
        splitter: SplitterKind::Token,
        chunk_size: INDEX_CHUNK_SIZE,
        chunk_overlap: INDEX_OVERLAP,
        ..SplitterOptions::default()
    };
    let mut pipeline = Pipeline::new(ChunkProcessor::new(Arc::clone(&counter)));
    pipeline
        .add_step(Box::new(TextPreprocessor::new("Text Preprocessor", &PreprocessOptions::default())?))
        .add_step(Box::new(LibrarySplitter::new("Token Splitter", &splitter, counter)?));
    Ok(pipeline)
}

async fn cmd_index(cli: &Cli, file: &Path, format: OutputFormat) -> Result<String> {
    let config = load_config(cli)?;
    let embedder = embedder(cli, &config)?;
    let text = read_corpus(file, &config.corpus)?;

    let result = index_pipeline(token_counter()?)?.execute(&text).await?;
    let chunks: Vec<String> = result.chunks.into_iter().map(|c| c.content).collect();
    let records = build_records(&chunks, embedder.as_ref()).await?;

    let db_path = cli.get_db_path();
    let store = SqliteStore::open(&db_path)?;
    store.clear()?;
    store.write_records(&records)?;

    tracing::info!(records = records.len(), db = %db_path.display(), "index written");
    Ok(format_index(records.len(), &db_path, embedder.model_name(), format))
}

async fn cmd_search(cli: &Cli, query: &str, top_k: usize, format: OutputFormat) -> Result<String> {
    let config = load_config(cli)?;
    let db_path = cli.get_db_path();
    if !db_path.is_file() {
        return Err(CommandError::ExecutionFailed(format!(
            "no index at {}; run `chunkbench index` first",
            db_path.display()
        ))
        .into());
    }

    let store = Arc::new(SqliteStore::open(&db_path)?);
    let retriever = HybridRetriever::new(store, embedder(cli, &config)?)?;
    let hits = retriever.search(query, top_k).await?;
    Ok(format_search(query, &hits, SEARCH_PREVIEW_LEN, format))
}
