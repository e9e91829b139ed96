//! Chunking strategies for chunkbench.
//!
//! Every strategy implements [`ChunkingStrategy`]; [`ChunkProcessor`] runs
//! one over an input and produces chunks plus a performance report.
//! Strategies are selected by configuration:
//!
//! - **basic**: separator regex or fixed character windows
//! - **splitter**: recursive, token, character and markdown splitters
//! - **sentence**: Unicode sentences packed to a token budget
//! - **nlp**: abbreviation-aware sentences with lexical boundaries
//! - **semantic**: embedding-driven merging of adjacent chunks
//! - **preprocess**: text normalisation (one chunk)

pub mod basic;
pub mod config;
pub mod nlp;
pub mod preprocess;
pub mod processor;
pub mod semantic;
pub mod sentence;
pub mod splitter;
pub mod traits;

pub use basic::BasicChunker;
pub use config::{
    BasicOptions, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, DEFAULT_SIMILARITY_THRESHOLD, NamedStrategy,
    NlpOptions, PreprocessOptions, SemanticOptions, SentenceOptions, SplitMethod, SplitterKind,
    SplitterOptions, StrategyConfig,
};
pub use nlp::NlpChunker;
pub use preprocess::TextPreprocessor;
pub use processor::{ChunkProcessor, ChunkerResult};
pub use semantic::SemanticChunker;
pub use sentence::SentenceSplitter;
pub use splitter::{LibrarySplitter, TokenSizer};
pub use traits::{ChunkingStrategy, SplitOutput};

use crate::embedding::Embedder;
use crate::error::{ChunkingError, Error, Result};
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use std::sync::Arc;

/// Strategy types and one-line descriptions.
pub const STRATEGY_TYPES: [(&str, &str); 6] = [
    ("basic", "separator regex (character/word/sentence/paragraph) packed by tokens"),
    ("splitter", "recursive, token, character or markdown splitter"),
    ("sentence", "unicode sentences packed to a token budget"),
    ("nlp", "abbreviation-aware sentences with lexical topic boundaries"),
    ("semantic", "recursive split merged by embedding similarity"),
    ("preprocess", "lowercase and strip markup, numbers and stopwords"),
];

/// Shared collaborators for building strategies.
#[derive(Clone)]
pub struct StrategyContext {
    /// Token counter for token-sized strategies.
    pub counter: Arc<dyn TokenCounter>,
    /// Embedder for semantic strategies.
    pub embedder: Option<Arc<dyn Embedder>>,
}

impl StrategyContext {
    /// Context without an embedder.
    #[must_use]
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter,
            embedder: None,
        }
    }

    /// Adds an embedder.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

impl std::fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext")
            .field("counter", &self.counter.name())
            .field("embedder", &self.embedder.as_ref().map(|e| e.model_name().to_string()))
            .finish()
    }
}

/// A configured strategy.
#[derive(Debug)]
pub enum Strategy {
    /// See [`BasicChunker`].
    Basic(BasicChunker),
    /// See [`LibrarySplitter`].
    Splitter(LibrarySplitter),
    /// See [`SentenceSplitter`].
    Sentence(SentenceSplitter),
    /// See [`NlpChunker`].
    Nlp(NlpChunker),
    /// See [`SemanticChunker`].
    Semantic(SemanticChunker),
    /// See [`TextPreprocessor`].
    Preprocess(TextPreprocessor),
}

impl Strategy {
    fn inner(&self) -> &dyn ChunkingStrategy {
        match self {
            Self::Basic(s) => s,
            Self::Splitter(s) => s,
            Self::Sentence(s) => s,
            Self::Nlp(s) => s,
            Self::Semantic(s) => s,
            Self::Preprocess(s) => s,
        }
    }
}

#[async_trait]
impl ChunkingStrategy for Strategy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn target_chunk_size(&self) -> usize {
        self.inner().target_chunk_size()
    }

    fn tracks_overlap(&self) -> bool {
        self.inner().tracks_overlap()
    }

    fn separators(&self) -> Option<&[String]> {
        self.inner().separators()
    }

    fn is_deterministic(&self) -> bool {
        self.inner().is_deterministic()
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        self.inner().split(text).await
    }
}

/// Builds a strategy from its configuration.
///
/// # Errors
///
/// Returns a chunking error for invalid options and [`Error::Config`] for a
/// semantic strategy without an embedder.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{
///     ChunkingStrategy, NamedStrategy, SentenceOptions, StrategyConfig, StrategyContext,
///     create_strategy,
/// };
/// use chunkbench::tokenizer::WhitespaceCounter;
/// use std::sync::Arc;
///
/// let entry = NamedStrategy::unnamed(StrategyConfig::Sentence(SentenceOptions::default()));
/// let context = StrategyContext::new(Arc::new(WhitespaceCounter));
/// let strategy = create_strategy(&entry, &context).unwrap();
/// assert_eq!(strategy.name(), "Sentence Splitter");
/// ```
pub fn create_strategy(entry: &NamedStrategy, context: &StrategyContext) -> Result<Strategy> {
    let name = entry.display_name();
    let counter = Arc::clone(&context.counter);
    let strategy = match &entry.config {
        StrategyConfig::Basic(o) => Strategy::Basic(BasicChunker::new(&name, o, counter)?),
        StrategyConfig::Splitter(o) => Strategy::Splitter(LibrarySplitter::new(&name, o, counter)?),
        StrategyConfig::Sentence(o) => Strategy::Sentence(SentenceSplitter::new(&name, o, counter)?),
        StrategyConfig::Nlp(o) => Strategy::Nlp(NlpChunker::new(&name, o, counter)?),
        StrategyConfig::Semantic(o) => {
            let embedder = context.embedder.clone().ok_or_else(|| {
                Error::config(format!("strategy '{name}' needs an embedder"))
            })?;
            Strategy::Semantic(SemanticChunker::new(&name, o, embedder)?)
        }
        StrategyConfig::Preprocess(o) => Strategy::Preprocess(TextPreprocessor::new(&name, o)?),
    };
    Ok(strategy)
}

/// Parses a strategy type name into its default configuration.
///
/// # Errors
///
/// Returns [`ChunkingError::UnknownStrategy`] for an unrecognised name.
pub fn default_config(type_name: &str) -> Result<StrategyConfig> {
    match type_name.to_lowercase().as_str() {
        "basic" => Ok(StrategyConfig::Basic(BasicOptions::default())),
        "splitter" => Ok(StrategyConfig::Splitter(SplitterOptions::default())),
        "sentence" => Ok(StrategyConfig::Sentence(SentenceOptions::default())),
        "nlp" => Ok(StrategyConfig::Nlp(NlpOptions::default())),
        "semantic" => Ok(StrategyConfig::Semantic(SemanticOptions::default())),
        "preprocess" => Ok(StrategyConfig::Preprocess(PreprocessOptions::default())),
        _ => Err(ChunkingError::UnknownStrategy {
            name: type_name.to_string(),
        }
        .into()),
    }
}

/// Lists available strategy type names.
#[must_use]
pub fn available_strategies() -> Vec<&'static str> {
    STRATEGY_TYPES.iter().map(|(name, _)| *name).collect()
}

/// The strategies compared when no configuration names any, at size 512
/// and overlap 50.
#[must_use]
pub fn default_strategies() -> Vec<NamedStrategy> {
    const SIZE: usize = 512;
    const OVERLAP: usize = 50;

    let splitter = |kind| SplitterOptions {
        splitter: kind,
        chunk_size: SIZE,
        chunk_overlap: OVERLAP,
        ..SplitterOptions::default()
    };
    let basic = |method| BasicOptions {
        chunk_size: SIZE,
        chunk_overlap: OVERLAP,
        method,
    };

    vec![
        NamedStrategy::unnamed(StrategyConfig::Splitter(splitter(SplitterKind::Recursive))),
        NamedStrategy::unnamed(StrategyConfig::Splitter(splitter(SplitterKind::Token))),
        NamedStrategy::unnamed(StrategyConfig::Nlp(NlpOptions {
            max_chunk_size: SIZE,
            overlap: OVERLAP,
            ..NlpOptions::default()
        })),
        NamedStrategy::unnamed(StrategyConfig::Basic(basic(SplitMethod::Paragraph))),
        NamedStrategy::unnamed(StrategyConfig::Basic(basic(SplitMethod::Sentence))),
        NamedStrategy::unnamed(StrategyConfig::Sentence(SentenceOptions {
            chunk_size: SIZE,
            chunk_overlap: OVERLAP,
        })),
        NamedStrategy::unnamed(StrategyConfig::Semantic(SemanticOptions {
            chunk_size: SIZE,
            chunk_overlap: OVERLAP,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        })),
    ]
}
