//! Abbreviation-aware sentence chunking.
//!
//! Sentences are packed up to `max_chunk_size` tokens. When overlap is
//! enabled the last `carry_sentences` sentences of a flushed chunk start the
//! next one. Optional lexical boundaries cut a chunk where a later sentence
//! shares the most content terms with an earlier one.

use crate::analysis::content_terms;
use crate::chunking::config::{NlpOptions, validate_size};
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::error::{ChunkingError, Result};
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// How many following sentences are compared when looking for a boundary.
const BOUNDARY_WINDOW: usize = 50;

/// Sentence chunker with abbreviation handling and lexical boundaries.
pub struct NlpChunker {
    name: String,
    options: NlpOptions,
    abbreviations: HashSet<String>,
    counter: Arc<dyn TokenCounter>,
}

/// A chunk under construction; sentences before `fresh_from` were carried
/// over from the previous chunk.
struct Draft<'a> {
    sentences: Vec<&'a str>,
    fresh_from: usize,
}

impl Draft<'_> {
    fn text(&self) -> String {
        self.sentences.join(" ")
    }
}

impl NlpChunker {
    /// Creates an NLP chunker.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero size, an overlap not smaller
    /// than the size, or a minimum size above the maximum.
    pub fn new(name: &str, options: &NlpOptions, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        validate_size(options.max_chunk_size, options.overlap)?;
        if options.min_chunk_size > options.max_chunk_size {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "min_chunk_size {} exceeds max_chunk_size {}",
                    options.min_chunk_size, options.max_chunk_size
                ),
            }
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            abbreviations: options.abbreviations.iter().cloned().collect(),
            counter,
        })
    }

    /// Splits `text` into sentences, not breaking after known abbreviations.
    #[must_use]
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if matches!(next, '.' | '!' | '?' | '"' | '\'' | ')' | ']') {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let at_break = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
            if !at_break || (c == '.' && self.is_abbreviation(&text[start..i])) {
                continue;
            }
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
        sentences
    }

    fn is_abbreviation(&self, before_period: &str) -> bool {
        let word = before_period
            .rsplit(|c: char| !c.is_alphabetic())
            .next()
            .unwrap_or_default();
        !word.is_empty() && self.abbreviations.contains(word)
    }

    /// Sentence indices where a new chunk should start.
    fn lexical_boundaries(sentences: &[&str]) -> HashSet<usize> {
        let terms: Vec<HashSet<String>> = sentences
            .iter()
            .map(|s| content_terms(s).into_iter().collect())
            .collect();

        let mut boundaries = HashSet::new();
        let mut current = 0;
        while current < sentences.len() {
            let window_end = (current + 1 + BOUNDARY_WINDOW).min(sentences.len());
            let mut best: Option<(usize, usize)> = None;
            for j in current + 1..window_end {
                let score = terms[current].intersection(&terms[j]).count();
                if score > 0 && best.is_none_or(|(_, s)| score > s) {
                    best = Some((j, score));
                }
            }
            match best {
                Some((j, _)) => {
                    boundaries.insert(j);
                    current = j;
                }
                None => current += 1,
            }
        }
        boundaries
    }
}

#[async_trait]
impl ChunkingStrategy for NlpChunker {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        self.options.max_chunk_size
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        let sentences = self.sentences(text);
        let boundaries = if self.options.semantic_boundaries {
            Self::lexical_boundaries(&sentences)
        } else {
            HashSet::new()
        };

        let mut drafts: Vec<Draft<'_>> = Vec::new();
        let mut current = Draft {
            sentences: Vec::new(),
            fresh_from: 0,
        };
        let mut tokens = 0;

        for (i, &sentence) in sentences.iter().enumerate() {
            let sentence_tokens = self.counter.count(sentence);

            if tokens + sentence_tokens > self.options.max_chunk_size && !current.sentences.is_empty() {
                let carried: Vec<&str> = if self.options.overlap > 0 {
                    let keep = current.sentences.len().min(self.options.carry_sentences);
                    current.sentences[current.sentences.len() - keep..].to_vec()
                } else {
                    Vec::new()
                };
                let fresh_from = carried.len();
                tokens = if carried.is_empty() {
                    0
                } else {
                    self.counter.count(&carried.join(" "))
                };
                drafts.push(std::mem::replace(
                    &mut current,
                    Draft {
                        sentences: carried,
                        fresh_from,
                    },
                ));
            }

            if boundaries.contains(&i) && current.sentences.len() > current.fresh_from {
                drafts.push(std::mem::replace(
                    &mut current,
                    Draft {
                        sentences: Vec::new(),
                        fresh_from: 0,
                    },
                ));
                tokens = 0;
            }

            current.sentences.push(sentence);
            tokens += sentence_tokens;
        }

        if current.sentences.len() > current.fresh_from {
            let small = self.counter.count(&current.text()) < self.options.min_chunk_size;
            match drafts.last_mut() {
                Some(previous) if small => {
                    previous
                        .sentences
                        .extend_from_slice(&current.sentences[current.fresh_from..]);
                }
                _ => drafts.push(current),
            }
        }

        Ok(SplitOutput::local(drafts.iter().map(Draft::text).collect()))
    }
}

impl std::fmt::Debug for NlpChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NlpChunker")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceCounter;

    fn chunker(max: usize, min: usize, overlap: usize, semantic: bool) -> NlpChunker {
        let options = NlpOptions {
            max_chunk_size: max,
            min_chunk_size: min,
            overlap,
            semantic_boundaries: semantic,
            ..NlpOptions::default()
        };
        NlpChunker::new("test", &options, Arc::new(WhitespaceCounter)).unwrap()
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let c = chunker(100, 0, 0, false);
        let sentences = c.sentences("Dr. Smith met Mrs. Jones. They talked! Was it long? No");
        assert_eq!(
            sentences,
            vec!["Dr. Smith met Mrs. Jones.", "They talked!", "Was it long?", "No"]
        );
    }

    #[test]
    fn test_decimal_point_not_a_break() {
        let c = chunker(100, 0, 0, false);
        assert_eq!(c.sentences("Pi is 3.14 roughly. Yes."), vec!["Pi is 3.14 roughly.", "Yes."]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let c = chunker(100, 0, 0, false);
        assert_eq!(
            c.sentences("He said \"stop.\" Then left."),
            vec!["He said \"stop.\"", "Then left."]
        );
    }

    #[tokio::test]
    async fn test_carries_last_two_sentences() {
        let c = chunker(6, 0, 1, false);
        let output = c.split("A b. C d. E f. G h.").await.unwrap();
        assert_eq!(output.pieces, vec!["A b. C d. E f.", "C d. E f. G h."]);
    }

    #[tokio::test]
    async fn test_no_overlap() {
        let c = chunker(4, 0, 0, false);
        let output = c.split("A b. C d. E f.").await.unwrap();
        assert_eq!(output.pieces, vec!["A b. C d.", "E f."]);
    }

    #[tokio::test]
    async fn test_small_tail_merged() {
        let c = chunker(4, 3, 0, false);
        let output = c.split("A b. C d. E.").await.unwrap();
        assert_eq!(output.pieces, vec!["A b. C d. E."]);
    }

    #[test]
    fn test_lexical_boundaries() {
        let sentences = [
            "Rust ownership rules.",
            "Cats sleep often.",
            "Ownership prevents races.",
            "Races matter.",
        ];
        let boundaries = NlpChunker::lexical_boundaries(&sentences);
        assert!(boundaries.contains(&2));
        assert!(boundaries.contains(&3));
        assert!(!boundaries.contains(&1));
    }

    #[tokio::test]
    async fn test_boundary_cuts_chunk() {
        let c = chunker(100, 0, 0, true);
        let output = c
            .split("Rust ownership rules. Cats sleep often. Ownership prevents bugs.")
            .await
            .unwrap();
        assert_eq!(
            output.pieces,
            vec!["Rust ownership rules. Cats sleep often.", "Ownership prevents bugs."]
        );
    }

    #[test]
    fn test_min_above_max_rejected() {
        let options = NlpOptions {
            max_chunk_size: 10,
            min_chunk_size: 20,
            overlap: 0,
            ..NlpOptions::default()
        };
        assert!(NlpChunker::new("bad", &options, Arc::new(WhitespaceCounter)).is_err());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let text = "Mr. Brown reads books. Books teach Mr. Brown! Does reading help? It does. ".repeat(15);
        let c = chunker(20, 5, 5, true);
        assert_eq!(c.split(&text).await.unwrap(), c.split(&text).await.unwrap());
    }
}
