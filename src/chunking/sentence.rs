//! Sentence packing to a token budget.

use crate::chunking::config::{SentenceOptions, validate_size};
use crate::chunking::traits::{ChunkingStrategy, SplitOutput};
use crate::error::Result;
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Packs Unicode sentences into chunks of at most `chunk_size` tokens.
///
/// After a chunk is flushed, trailing sentences totalling at most
/// `chunk_overlap` tokens are repeated at the start of the next one. A single
/// sentence over budget becomes its own chunk.
pub struct SentenceSplitter {
    name: String,
    options: SentenceOptions,
    counter: Arc<dyn TokenCounter>,
}

impl SentenceSplitter {
    /// Creates a sentence splitter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero size or an overlap not
    /// smaller than the size.
    pub fn new(name: &str, options: &SentenceOptions, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        validate_size(options.chunk_size, options.chunk_overlap)?;
        Ok(Self {
            name: name.to_string(),
            options: options.clone(),
            counter,
        })
    }
}

#[async_trait]
impl ChunkingStrategy for SentenceSplitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_chunk_size(&self) -> usize {
        self.options.chunk_size
    }

    async fn split(&self, text: &str) -> Result<SplitOutput> {
        let sentences: Vec<(&str, usize)> = text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (s, self.counter.count(s)))
            .collect();

        let budget = self.options.chunk_size;
        let mut chunks = Vec::new();
        let mut current: Vec<(&str, usize)> = Vec::new();
        let mut tokens = 0;

        for (sentence, count) in sentences {
            if tokens + count > budget && !current.is_empty() {
                chunks.push(join(&current));
                let carried = carry_over(&current, self.options.chunk_overlap, budget - count.min(budget));
                tokens = carried.iter().map(|(_, n)| n).sum();
                current = carried;
            }
            current.push((sentence, count));
            tokens += count;
        }
        if !current.is_empty() {
            chunks.push(join(&current));
        }

        Ok(SplitOutput::local(chunks))
    }
}

impl std::fmt::Debug for SentenceSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceSplitter")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn join(sentences: &[(&str, usize)]) -> String {
    sentences
        .iter()
        .map(|(s, _)| *s)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Longest run of trailing sentences within both `overlap` and `room` tokens.
fn carry_over<'a>(sentences: &[(&'a str, usize)], overlap: usize, room: usize) -> Vec<(&'a str, usize)> {
    let limit = overlap.min(room);
    let mut carried = Vec::new();
    let mut total = 0;
    for &(sentence, count) in sentences.iter().rev() {
        if total + count > limit {
            break;
        }
        carried.push((sentence, count));
        total += count;
    }
    carried.reverse();
    carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceCounter;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> SentenceSplitter {
        let options = SentenceOptions {
            chunk_size,
            chunk_overlap,
        };
        SentenceSplitter::new("test", &options, Arc::new(WhitespaceCounter)).unwrap()
    }

    #[tokio::test]
    async fn test_packs_whole_sentences() {
        let text = "One two three. Four five. Six seven eight.";
        let output = splitter(5, 0).split(text).await.unwrap();
        assert_eq!(output.pieces, vec!["One two three. Four five.", "Six seven eight."]);
    }

    #[tokio::test]
    async fn test_overlap_repeats_trailing_sentence() {
        let text = "A b. C d. E f. G h.";
        let output = splitter(4, 2).split(text).await.unwrap();
        assert_eq!(output.pieces, vec!["A b. C d.", "C d. E f.", "E f. G h."]);
    }

    #[tokio::test]
    async fn test_long_sentence_alone() {
        let text = "Short. This sentence is far too long for the budget. End.";
        let output = splitter(3, 1).split(text).await.unwrap();
        assert_eq!(output.pieces.len(), 3);
        assert_eq!(output.pieces[1], "This sentence is far too long for the budget.");
    }

    #[tokio::test]
    async fn test_deterministic() {
        let text = "The quick brown fox. Jumps over the dog! Does it? Yes. ".repeat(25);
        let s = splitter(12, 4);
        assert_eq!(s.split(&text).await.unwrap(), s.split(&text).await.unwrap());
    }
}
