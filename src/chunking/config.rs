//! Strategy configuration.
//!
//! Every option has a default and unknown keys are ignored, so a config file
//! only needs to name what it changes:
//!
//! ```
//! use chunkbench::chunking::{NamedStrategy, StrategyConfig, SplitMethod};
//!
//! let entry: NamedStrategy =
//!     serde_json::from_str(r#"{"type": "basic", "method": "word", "colour": "blue"}"#).unwrap();
//! match entry.config {
//!     StrategyConfig::Basic(options) => {
//!         assert_eq!(options.method, SplitMethod::Word);
//!         assert_eq!(options.chunk_size, 500);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use crate::error::{ChunkingError, Result};
use serde::{Deserialize, Serialize};

/// Default target chunk size in tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 50;

/// Default cosine threshold for merging adjacent chunks.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Separators tried in order by the recursive splitter.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Abbreviations that do not end a sentence.
pub const DEFAULT_ABBREVIATIONS: [&str; 6] = ["Mr", "Mrs", "Dr", "Prof", "Sr", "Jr"];

/// A strategy entry with an optional display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedStrategy {
    /// Display name; derived from the configuration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Strategy configuration.
    #[serde(flatten)]
    pub config: StrategyConfig,
}

impl NamedStrategy {
    /// Creates an entry with an explicit name.
    #[must_use]
    pub fn new(name: impl Into<String>, config: StrategyConfig) -> Self {
        Self {
            name: Some(name.into()),
            config,
        }
    }

    /// Creates an entry named after its configuration.
    #[must_use]
    pub const fn unnamed(config: StrategyConfig) -> Self {
        Self { name: None, config }
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.config.default_name())
    }
}

/// Closed set of strategy configurations, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Hand-rolled separator or window splitting.
    Basic(BasicOptions),
    /// Library splitters (recursive, token, character, markdown).
    Splitter(SplitterOptions),
    /// Unicode sentence packing to a token budget.
    Sentence(SentenceOptions),
    /// Abbreviation-aware sentence chunking with lexical boundaries.
    Nlp(NlpOptions),
    /// Embedding-driven merging of adjacent chunks.
    Semantic(SemanticOptions),
    /// Text normalisation stage.
    Preprocess(PreprocessOptions),
}

impl StrategyConfig {
    /// The `type` tag of this configuration.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Basic(_) => "basic",
            Self::Splitter(_) => "splitter",
            Self::Sentence(_) => "sentence",
            Self::Nlp(_) => "nlp",
            Self::Semantic(_) => "semantic",
            Self::Preprocess(_) => "preprocess",
        }
    }

    /// Display name derived from the options.
    #[must_use]
    pub fn default_name(&self) -> String {
        match self {
            Self::Basic(o) => format!("Basic {}", o.method.label()),
            Self::Splitter(o) => format!("{} Splitter", o.splitter.label()),
            Self::Sentence(_) => "Sentence Splitter".to_string(),
            Self::Nlp(_) => "NLP Chunker".to_string(),
            Self::Semantic(_) => "Semantic".to_string(),
            Self::Preprocess(_) => "Text Preprocessor".to_string(),
        }
    }
}

/// How the basic strategy segments text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// Fixed character windows.
    Character,
    /// Whitespace-separated words.
    Word,
    /// Runs of `.`, `!`, `?`.
    Sentence,
    /// Blank-line separated paragraphs.
    #[default]
    Paragraph,
}

impl SplitMethod {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Word => "Word",
            Self::Sentence => "Sentence",
            Self::Paragraph => "Paragraph",
        }
    }
}

/// Options for the basic strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicOptions {
    /// Target chunk size (tokens; characters for [`SplitMethod::Character`]).
    pub chunk_size: usize,
    /// Overlap (characters for [`SplitMethod::Character`]; any non-zero
    /// value keeps the last segment otherwise).
    pub chunk_overlap: usize,
    /// Segmentation method.
    pub method: SplitMethod,
}

impl Default for BasicOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            method: SplitMethod::default(),
        }
    }
}

/// Which library splitter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// Recursive semantic-level splitting, sized in characters.
    #[default]
    Recursive,
    /// Recursive splitting sized in tokens.
    Token,
    /// Single-separator split and merge, sized in characters.
    Character,
    /// Markdown-aware splitting, sized in characters.
    Markdown,
}

impl SplitterKind {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recursive => "Recursive",
            Self::Token => "Token",
            Self::Character => "Character",
            Self::Markdown => "Markdown",
        }
    }
}

/// Options for the library splitters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterOptions {
    /// Splitter variant.
    pub splitter: SplitterKind,
    /// Target chunk size.
    pub chunk_size: usize,
    /// Overlap between chunks.
    pub chunk_overlap: usize,
    /// Separators for the character splitter, which splits on the first
    /// one. The other variants choose their own boundaries and reject a
    /// list other than the default; the list still drives separator usage
    /// in the report.
    pub separators: Vec<String>,
}

impl Default for SplitterOptions {
    fn default() -> Self {
        Self {
            splitter: SplitterKind::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Options for sentence packing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceOptions {
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Tokens of trailing sentences repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Options for the NLP chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpOptions {
    /// Token budget per chunk.
    pub max_chunk_size: usize,
    /// A trailing chunk below this many tokens is merged into its
    /// predecessor.
    pub min_chunk_size: usize,
    /// Non-zero enables sentence carry-over between chunks.
    pub overlap: usize,
    /// Sentences carried over when overlap is enabled.
    pub carry_sentences: usize,
    /// Cut chunks at lexical topic boundaries.
    pub semantic_boundaries: bool,
    /// Abbreviations that do not terminate a sentence.
    pub abbreviations: Vec<String>,
}

impl Default for NlpOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_CHUNK_SIZE,
            min_chunk_size: 100,
            overlap: DEFAULT_OVERLAP,
            carry_sentences: 2,
            semantic_boundaries: true,
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Options for the semantic chunker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticOptions {
    /// Character size of the initial recursive split.
    pub chunk_size: usize,
    /// Character overlap of the initial split.
    pub chunk_overlap: usize,
    /// Cosine similarity at or above which adjacent chunks merge.
    pub similarity_threshold: f32,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Options for the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PreprocessOptions {
    /// Lowercase the text.
    pub lowercase: bool,
    /// Strip HTML tags.
    pub remove_html: bool,
    /// Strip URLs.
    pub remove_urls: bool,
    /// Strip email addresses.
    pub remove_emails: bool,
    /// Strip digits.
    pub remove_numbers: bool,
    /// Drop English stopwords.
    pub remove_stopwords: bool,
    /// Extra regex patterns to strip.
    pub custom_patterns: Vec<String>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_html: true,
            remove_urls: true,
            remove_emails: true,
            remove_numbers: true,
            remove_stopwords: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Validates a size/overlap pair.
///
/// # Errors
///
/// Returns [`ChunkingError::InvalidConfig`] for a zero size and
/// [`ChunkingError::OverlapTooLarge`] when `overlap >= size`.
pub fn validate_size(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidConfig {
            reason: "chunk_size must be > 0".to_string(),
        }
        .into());
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            size: chunk_size,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let entry: NamedStrategy = serde_json::from_str(r#"{"type": "splitter"}"#).unwrap();
        assert!(entry.name.is_none());
        let StrategyConfig::Splitter(options) = entry.config else {
            unreachable!("expected splitter config");
        };
        assert_eq!(options.splitter, SplitterKind::Recursive);
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.separators, vec!["\n\n", "\n", " ", ""]);
    }

    #[test]
    fn test_unknown_options_ignored() {
        let entry: NamedStrategy = serde_json::from_str(
            r#"{"name": "Mine", "type": "semantic", "similarity_threshold": 0.5, "language": "en"}"#,
        )
        .unwrap();
        assert_eq!(entry.display_name(), "Mine");
        let StrategyConfig::Semantic(options) = entry.config else {
            unreachable!("expected semantic config");
        };
        assert!((options.similarity_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(options.chunk_overlap, DEFAULT_OVERLAP);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_str::<NamedStrategy>(r#"{"type": "quantum"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_names() {
        let basic = StrategyConfig::Basic(BasicOptions {
            method: SplitMethod::Word,
            ..BasicOptions::default()
        });
        assert_eq!(basic.default_name(), "Basic Word");

        let token = StrategyConfig::Splitter(SplitterOptions {
            splitter: SplitterKind::Token,
            ..SplitterOptions::default()
        });
        assert_eq!(NamedStrategy::unnamed(token).display_name(), "Token Splitter");
    }

    #[test]
    fn test_round_trip_keeps_tag() {
        let entry = NamedStrategy::new("Nlp", StrategyConfig::Nlp(NlpOptions::default()));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "nlp");
        assert_eq!(json["name"], "Nlp");
    }

    #[test]
    fn test_validate_size() {
        assert!(validate_size(500, 50).is_ok());
        assert!(validate_size(0, 0).is_err());
        assert!(matches!(
            validate_size(50, 50),
            Err(crate::Error::Chunking(ChunkingError::OverlapTooLarge { .. }))
        ));
    }
}
