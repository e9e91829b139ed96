//! Core domain models.
//!
//! Chunks and performance reports are pure values created per run; they have
//! no I/O dependencies.

pub mod chunk;
pub mod report;

pub use chunk::{Chunk, ChunkMetadata, join_contents};
pub use report::{
    DensityStats, Measurement, OverlapStats, PerformanceReport, SeparatorUsage, SizeDistribution,
};
