//! Performance report for one strategy run.
//!
//! A report is a value object computed once per (strategy, input) pair. The
//! content-derived fields come from the statistics engine; timing and memory
//! are measured by the caller around the split.

use crate::analysis::ContentStatistics;
use serde::{Deserialize, Serialize};

/// Token-size distribution over a chunk sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistribution {
    /// Smallest chunk, in tokens.
    pub min: usize,
    /// Largest chunk, in tokens.
    pub max: usize,
    /// Upper median: element `n / 2` of the ascending-sorted counts.
    pub median: usize,
}

/// Sentence and word density per chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DensityStats {
    /// Average sentences per chunk.
    pub avg_sentences: f64,
    /// Fewest sentences in a chunk.
    pub min_sentences: usize,
    /// Most sentences in a chunk.
    pub max_sentences: usize,
    /// Average words per chunk.
    pub avg_words: f64,
    /// Fewest words in a chunk.
    pub min_words: usize,
    /// Most words in a chunk.
    pub max_words: usize,
}

/// Overlap between adjacent chunks, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapStats {
    /// Average overlap length.
    pub average: f64,
    /// Shortest overlap.
    pub min: usize,
    /// Longest overlap.
    pub max: usize,
    /// Average overlap divided by the configured target chunk size.
    pub ratio: f64,
}

/// Occurrences of one separator in the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparatorUsage {
    /// The separator string.
    pub separator: String,
    /// Number of occurrences.
    pub count: usize,
}

/// Measurements of one strategy run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Wall-clock time spent splitting, in milliseconds.
    pub total_time_ms: f64,
    /// Number of chunks produced.
    pub chunks_created: usize,
    /// Average chunk size in tokens.
    pub average_chunk_size: f64,
    /// Sum of chunk token counts.
    pub tokens_processed: usize,
    /// Resident memory after minus before, in bytes.
    ///
    /// Sampled from the whole process, so work running concurrently with
    /// the split (other strategies of a concurrent comparison included) is
    /// counted too.
    pub memory_delta_bytes: i64,
    /// Token-size distribution.
    pub size_distribution: SizeDistribution,
    /// Sentence/word density.
    pub chunk_stats: DensityStats,
    /// Present when the strategy tracks overlap.
    pub overlap: Option<OverlapStats>,
    /// Present for separator-driven strategies.
    pub separators: Option<Vec<SeparatorUsage>>,
    /// External (embedding) calls made during the run, for strategies that
    /// make them.
    pub external_calls: Option<usize>,
}

/// Elapsed time and memory delta measured around a split.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    /// Elapsed milliseconds.
    pub elapsed_ms: f64,
    /// Memory delta in bytes.
    pub memory_delta_bytes: i64,
}

impl PerformanceReport {
    /// The zero-valued report for a run that produced no chunks.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combines content statistics with the caller's measurements.
    #[must_use]
    pub fn assemble(
        content: ContentStatistics,
        measurement: Measurement,
        separators: Option<Vec<SeparatorUsage>>,
        external_calls: Option<usize>,
    ) -> Self {
        Self {
            total_time_ms: measurement.elapsed_ms,
            chunks_created: content.chunks_created,
            average_chunk_size: content.average_chunk_size,
            tokens_processed: content.tokens_processed,
            memory_delta_bytes: measurement.memory_delta_bytes,
            size_distribution: content.size_distribution,
            chunk_stats: content.chunk_stats,
            overlap: content.overlap,
            separators,
            external_calls,
        }
    }

    /// Chunks per second, 0 when no time was measured.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn chunks_per_second(&self) -> f64 {
        if self.total_time_ms <= 0.0 {
            return 0.0;
        }
        self.chunks_created as f64 / (self.total_time_ms / 1000.0)
    }

    /// Memory delta in megabytes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn memory_delta_mb(&self) -> f64 {
        self.memory_delta_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_zeroed() {
        let report = PerformanceReport::empty();
        assert_eq!(report.chunks_created, 0);
        assert_eq!(report.size_distribution, SizeDistribution::default());
        assert!(report.overlap.is_none());
        assert!(report.separators.is_none());
        assert!(report.external_calls.is_none());
        assert!(report.chunks_per_second().abs() < f64::EPSILON);
    }

    #[test]
    fn test_chunks_per_second() {
        let report = PerformanceReport {
            total_time_ms: 500.0,
            chunks_created: 10,
            ..PerformanceReport::default()
        };
        assert!((report.chunks_per_second() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_memory_delta_mb_negative() {
        let report = PerformanceReport {
            memory_delta_bytes: -2 * 1024 * 1024,
            ..PerformanceReport::default()
        };
        assert!((report.memory_delta_mb() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_optional_sections_serialize_as_null() {
        let json = serde_json::to_value(PerformanceReport::empty()).unwrap();
        assert!(json["overlap"].is_null());
        assert!(json["separators"].is_null());
        assert_eq!(json["size_distribution"]["median"], 0);
    }
}
