//! Rank fusion for combining retrieval methods.
//!
//! Full-text (BM25) and vector rankings are merged with Reciprocal Rank
//! Fusion; see [`crate::store::HybridRetriever`] for the retrieval side.

pub mod rrf;

pub use rrf::{
    DEFAULT_RRF_K, FusedResult, RankedResult, RrfConfig, reciprocal_rank_fusion, weighted_rrf,
};
