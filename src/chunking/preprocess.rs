//! Text normalisation as a pipeline stage.

use crate::analysis::is_stopword;
use crate::chunking::config::PreprocessOptions;
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;

const HTML_PATTERN: &str = r"<[^>]*>";
const URL_PATTERN: &str = r"https?://\S+";
const EMAIL_PATTERN: &str = r"[\w.-]+@[\w.-]+\.\w+";
const NUMBER_PATTERN: &str = r"\d+";

/// Cleans text for indexing: lowercases, strips markup, URLs, emails,
/// numbers and custom patterns, keeps only letters and whitespace, collapses
/// whitespace, and drops stopwords.
///
/// Emits the cleaned text as a single chunk, or nothing when no words
/// survive.
///
/// # Examples
///
/// ```
/// use chunkbench::chunking::{PreprocessOptions, TextPreprocessor};
///
/// let pre = TextPreprocessor::new("pre", &PreprocessOptions::default()).unwrap();
/// assert_eq!(pre.clean("<p>The Cats, 3 of them!</p> https://x.io"), "cats");
/// ```
#[derive(Debug)]
pub struct TextPreprocessor {
    name: String,
    options: PreprocessOptions,
    strip: Vec<Regex>,
    non_letters: Regex,
}

impl TextPreprocessor {
    /// Creates a preprocessor, compiling its patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::Regex`](crate::error::ChunkingError::Regex)
    /// if a custom pattern is invalid.
    pub fn new(name: &str, options: &PreprocessOptions) -> Result<Self> {
        let mut patterns: Vec<&str> = Vec::new();
        if options.remove_html {
            patterns.push(HTML_PATTERN);
        }
        if options.remove_urls {
            patterns.push(URL_PATTERN);
        }
        if options.remove_emails {
            patterns.push(EMAIL_PATTERN);
        }
        if options.remove_numbers {
            patterns.push(NUMBER_PATTERN);
        }
        patterns.extend(options.custom_patterns.iter().map(String::as_str));

        let strip = patterns
            .into_iter()
            .map(Regex::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let non_letters = if options.lowercase {
            Regex::new(r"[^a-z\s]")?
        } else {
            Regex::new(r"[^A-Za-z\s]")?
        };

        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            strip,
            non_letters,
        })
    }

    /// Returns the cleaned form of `text`.
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        let mut processed = if self.options.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        for pattern in &self.strip {
            processed = pattern.replace_all(&processed, "").into_owned();
        }
        processed = self.non_letters.replace_all(&processed, " ").into_owned();

        processed
            .split_whitespace()
            .filter(|w| !self.options.remove_stopwords || !is_stopword(&w.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ChunkingStrategy for TextPreprocessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        0
    }

    fn tracks_overlap(&self) -> bool {
        false
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        let cleaned = self.clean(text);
        let pieces = if cleaned.is_empty() {
            Vec::new()
        } else {
            vec![cleaned]
        };
        Ok(SplitOutput::local(pieces))
    }
}
