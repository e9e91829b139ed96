//! Chunk analysis: overlap detection, statistics, and measurement probes.

pub mod overlap;
pub mod probe;
pub mod stats;
pub mod stopwords;

pub use overlap::{longest_suffix_prefix_overlap, longest_suffix_prefix_overlap_linear};
pub use probe::{Clock, FixedMemory, MemoryProbe, ProcessMemoryProbe, StepClock, SystemClock};
pub use stats::{
    ContentStatistics, StatisticsOptions, compute_statistics, count_separators, sentence_count,
    size_distribution, word_count,
};
pub use stopwords::{content_terms, is_stopword};
