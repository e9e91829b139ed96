//! Content-derived chunk statistics.
//!
//! Everything here is a pure function of its arguments: no clock, no memory
//! sampling, no I/O. Timing fields are filled in by the caller.

use crate::analysis::overlap::{
    longest_suffix_prefix_overlap, longest_suffix_prefix_overlap_linear,
};
use crate::core::{DensityStats, OverlapStats, SeparatorUsage, SizeDistribution};
use crate::error::{Result, StatisticsError};
use crate::tokenizer::TokenCounter;

/// Above this many characters in the shorter span, overlap uses the linear
/// algorithm instead of the quadratic scan.
pub const NAIVE_SCAN_LIMIT: usize = 512;

/// Inputs to [`compute_statistics`] besides the chunks themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsOptions {
    /// Configured target chunk size, the denominator of the overlap ratio.
    pub target_chunk_size: usize,
    /// Whether adjacent-chunk overlap is measured.
    pub track_overlap: bool,
}

impl StatisticsOptions {
    /// Options with overlap tracking enabled.
    #[must_use]
    pub const fn with_overlap(target_chunk_size: usize) -> Self {
        Self {
            target_chunk_size,
            track_overlap: true,
        }
    }

    /// Options without overlap tracking.
    #[must_use]
    pub const fn without_overlap() -> Self {
        Self {
            target_chunk_size: 0,
            track_overlap: false,
        }
    }
}

/// Content-derived fields of a performance report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStatistics {
    /// Token count of each chunk, in sequence order.
    pub token_counts: Vec<usize>,
    /// Number of chunks.
    pub chunks_created: usize,
    /// Sum of token counts.
    pub tokens_processed: usize,
    /// Mean token count.
    pub average_chunk_size: f64,
    /// Min/max/median token counts.
    pub size_distribution: SizeDistribution,
    /// Sentence/word density.
    pub chunk_stats: DensityStats,
    /// Adjacent-pair overlap, when tracked.
    pub overlap: Option<OverlapStats>,
}

/// Computes size distribution, density and overlap for an ordered chunk
/// sequence.
///
/// An empty sequence yields all-zero fields.
///
/// # Errors
///
/// Returns [`StatisticsError::ZeroTargetChunkSize`] when overlap tracking is
/// requested with a target chunk size of 0.
///
/// # Examples
///
/// ```
/// use chunkbench::analysis::{StatisticsOptions, compute_statistics};
/// use chunkbench::tokenizer::WhitespaceCounter;
///
/// let chunks = ["one two.", "two three four."];
/// let stats = compute_statistics(&chunks, &StatisticsOptions::with_overlap(4), &WhitespaceCounter).unwrap();
/// assert_eq!(stats.tokens_processed, 5);
/// assert_eq!(stats.size_distribution.median, 3);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn compute_statistics<S: AsRef<str>>(
    chunks: &[S],
    options: &StatisticsOptions,
    counter: &dyn TokenCounter,
) -> Result<ContentStatistics> {
    if options.track_overlap && options.target_chunk_size == 0 {
        return Err(StatisticsError::ZeroTargetChunkSize.into());
    }

    let token_counts: Vec<usize> = chunks.iter().map(|c| counter.count(c.as_ref())).collect();
    let tokens_processed: usize = token_counts.iter().sum();
    let n = chunks.len();

    let overlap = options.track_overlap.then(|| {
        let lengths: Vec<usize> = chunks
            .windows(2)
            .map(|pair| overlap_length(pair[0].as_ref(), pair[1].as_ref()))
            .collect();
        let average = mean(&lengths);
        OverlapStats {
            average,
            min: lengths.iter().copied().min().unwrap_or(0),
            max: lengths.iter().copied().max().unwrap_or(0),
            ratio: average / options.target_chunk_size as f64,
        }
    });

    if n == 0 {
        return Ok(ContentStatistics {
            overlap,
            ..ContentStatistics::default()
        });
    }

    let sentences: Vec<usize> = chunks.iter().map(|c| sentence_count(c.as_ref())).collect();
    let words: Vec<usize> = chunks.iter().map(|c| word_count(c.as_ref())).collect();

    Ok(ContentStatistics {
        chunks_created: n,
        tokens_processed,
        average_chunk_size: tokens_processed as f64 / n as f64,
        size_distribution: size_distribution(&token_counts),
        chunk_stats: DensityStats {
            avg_sentences: mean(&sentences),
            min_sentences: sentences.iter().copied().min().unwrap_or(0),
            max_sentences: sentences.iter().copied().max().unwrap_or(0),
            avg_words: mean(&words),
            min_words: words.iter().copied().min().unwrap_or(0),
            max_words: words.iter().copied().max().unwrap_or(0),
        },
        token_counts,
        overlap,
    })
}

/// Min, max and upper median of token counts; zeros for an empty slice.
#[must_use]
pub fn size_distribution(token_counts: &[usize]) -> SizeDistribution {
    if token_counts.is_empty() {
        return SizeDistribution::default();
    }
    let mut sorted = token_counts.to_vec();
    sorted.sort_unstable();
    SizeDistribution {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median: sorted[sorted.len() / 2],
    }
}

/// Pieces left after splitting on runs of `.`, `!` or `?` and dropping
/// whitespace-only pieces.
#[must_use]
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|piece| !piece.trim().is_empty())
        .count()
}

/// Pieces left after splitting on whitespace runs.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Occurrences of each separator in `text`, in separator order.
///
/// The empty separator matches at every character boundary.
#[must_use]
pub fn count_separators<S: AsRef<str>>(text: &str, separators: &[S]) -> Vec<SeparatorUsage> {
    separators
        .iter()
        .map(|sep| {
            let sep = sep.as_ref();
            let count = if sep.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(sep).count()
            };
            SeparatorUsage {
                separator: sep.to_string(),
                count,
            }
        })
        .collect()
}

fn overlap_length(a: &str, b: &str) -> usize {
    let shorter = a.chars().count().min(b.chars().count());
    if shorter > NAIVE_SCAN_LIMIT {
        longest_suffix_prefix_overlap_linear(a, b)
    } else {
        longest_suffix_prefix_overlap(a, b)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceCounter;
    use proptest::prelude::*;
    use test_case::test_case;

    /// Counts characters, so token sizes are easy to read off the inputs.
    struct CharCounter;

    impl TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.chars().count()
        }

        fn name(&self) -> &'static str {
            "chars"
        }
    }

    #[test]
    fn test_empty_sequence_is_zeroed() {
        let chunks: [&str; 0] = [];
        let stats =
            compute_statistics(&chunks, &StatisticsOptions::with_overlap(500), &CharCounter)
                .unwrap();
        assert_eq!(stats.chunks_created, 0);
        assert_eq!(stats.tokens_processed, 0);
        assert_eq!(stats.size_distribution, SizeDistribution::default());
        assert!(stats.average_chunk_size.abs() < f64::EPSILON);
        assert!(stats.chunk_stats.avg_sentences.abs() < f64::EPSILON);
        let overlap = stats.overlap.unwrap();
        assert_eq!(overlap.max, 0);
        assert!(!overlap.ratio.is_nan());
    }

    #[test]
    fn test_upper_median() {
        let dist = size_distribution(&[4, 1, 3, 2]);
        assert_eq!(dist.median, 3);
        assert_eq!(dist.min, 1);
        assert_eq!(dist.max, 4);

        assert_eq!(size_distribution(&[5, 1, 9]).median, 5);
        assert_eq!(size_distribution(&[7]).median, 7);
    }

    #[test]
    fn test_zero_target_size_is_an_error() {
        let err = compute_statistics(&["a", "b"], &StatisticsOptions::with_overlap(0), &CharCounter)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Statistics(StatisticsError::ZeroTargetChunkSize)
        ));
    }

    #[test]
    fn test_zero_target_size_without_overlap_is_fine() {
        let stats =
            compute_statistics(&["a b"], &StatisticsOptions::without_overlap(), &CharCounter)
                .unwrap();
        assert!(stats.overlap.is_none());
        assert_eq!(stats.tokens_processed, 3);
    }

    #[test]
    fn test_overlap_statistics() {
        let chunks = ["hello world", "world peace", "peace out"];
        let stats =
            compute_statistics(&chunks, &StatisticsOptions::with_overlap(10), &CharCounter)
                .unwrap();
        let overlap = stats.overlap.unwrap();
        assert_eq!(overlap.min, 5);
        assert_eq!(overlap.max, 5);
        assert!((overlap.average - 5.0).abs() < 1e-9);
        assert!((overlap.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_chunk_has_zero_overlap() {
        let stats =
            compute_statistics(&["only"], &StatisticsOptions::with_overlap(10), &CharCounter)
                .unwrap();
        let overlap = stats.overlap.unwrap();
        assert!(overlap.average.abs() < f64::EPSILON);
        assert_eq!(overlap.min, 0);
    }

    #[test]
    fn test_density() {
        let chunks = ["One. Two! Three?", "No terminator here", "...!!"];
        let stats =
            compute_statistics(&chunks, &StatisticsOptions::without_overlap(), &WhitespaceCounter)
                .unwrap();
        assert_eq!(stats.chunk_stats.max_sentences, 3);
        assert_eq!(stats.chunk_stats.min_sentences, 0);
        assert!((stats.chunk_stats.avg_sentences - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.chunk_stats.max_words, 3);
        assert_eq!(stats.chunk_stats.min_words, 1);
        assert_eq!(stats.token_counts, vec![3, 3, 1]);
    }

    #[test_case("Hello world. How are you?", 2 ; "two sentences")]
    #[test_case("Wait... what?! Really.", 3 ; "delimiter runs")]
    #[test_case("   ", 0 ; "whitespace only")]
    #[test_case("no punctuation", 1 ; "unterminated")]
    fn test_sentence_count(text: &str, expected: usize) {
        assert_eq!(sentence_count(text), expected);
    }

    #[test]
    fn test_count_separators() {
        let usage = count_separators("a\n\nb\nc d", &["\n\n", "\n", " ", ""]);
        let counts: Vec<usize> = usage.iter().map(|u| u.count).collect();
        assert_eq!(counts, vec![1, 3, 1, 9]);
        assert_eq!(usage[0].separator, "\n\n");
    }

    #[test]
    fn test_long_spans_use_linear_overlap() {
        let shared = "x".repeat(NAIVE_SCAN_LIMIT);
        let a = format!("{}{shared}", "a".repeat(600));
        let b = format!("{shared}{}", "b".repeat(600));
        assert_eq!(overlap_length(&a, &b), NAIVE_SCAN_LIMIT);
    }

    proptest! {
        #[test]
        fn prop_statistics_are_idempotent(chunks in proptest::collection::vec("[a-c .!?\n]{0,40}", 0..8)) {
            let options = StatisticsOptions::with_overlap(16);
            let first = compute_statistics(&chunks, &options, &WhitespaceCounter).unwrap();
            let second = compute_statistics(&chunks, &options, &WhitespaceCounter).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_distribution_bounds(counts in proptest::collection::vec(0usize..1000, 1..32)) {
            let dist = size_distribution(&counts);
            prop_assert!(dist.min <= dist.median);
            prop_assert!(dist.median <= dist.max);
        }
    }
}
