//! Reciprocal Rank Fusion (RRF) algorithm.
//!
//! Combines multiple ranked lists into a single fused ranking.
//! Based on: Cormack, Clarke, Buettcher (2009) - "Reciprocal Rank Fusion
//! outperforms Condorcet and individual Rank Learning Methods"

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default `k` constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// One result from a single retrieval method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Result identifier, shared across retrieval methods.
    pub id: String,
    /// Result content.
    pub content: String,
    /// Method-specific relevance score. Only the position in the list
    /// matters for fusion.
    pub score: f64,
}

impl RankedResult {
    /// Creates a ranked result.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
        }
    }
}

/// A fused score for one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    /// Result identifier.
    pub id: String,
    /// Sum of reciprocal-rank contributions.
    pub score: f64,
}

/// Configuration for RRF algorithm.
#[derive(Debug, Clone, Copy)]
pub struct RrfConfig {
    /// The k parameter controls how much weight is given to lower-ranked items.
    /// Higher k values give more weight to items ranked lower in the lists.
    pub k: u32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

impl RrfConfig {
    /// Creates a new RRF config with the specified k value.
    #[must_use]
    pub const fn new(k: u32) -> Self {
        Self { k }
    }
}

/// Performs Reciprocal Rank Fusion on multiple ranked lists.
///
/// Each item at zero-based rank `r` of a list adds `1 / (k + r + 1)` to its
/// identifier's score. The output is sorted by descending score; identifiers
/// with equal scores stay in first-seen order (lists in order, ranks
/// ascending).
///
/// # Examples
///
/// ```
/// use chunkbench::search::{RankedResult, RrfConfig, reciprocal_rank_fusion};
///
/// let bm25 = vec![RankedResult::new("x", "", 3.2), RankedResult::new("y", "", 1.1)];
/// let vector = vec![RankedResult::new("y", "", 0.9), RankedResult::new("x", "", 0.4)];
///
/// let fused = reciprocal_rank_fusion(&[&bm25, &vector], &RrfConfig::default());
/// // x and y tie; x was seen first
/// assert_eq!(fused[0].id, "x");
/// ```
#[must_use]
pub fn reciprocal_rank_fusion(
    ranked_lists: &[&[RankedResult]],
    config: &RrfConfig,
) -> Vec<FusedResult> {
    let weighted: Vec<(&[RankedResult], f64)> =
        ranked_lists.iter().map(|list| (*list, 1.0)).collect();
    weighted_rrf(&weighted, config)
}

/// Performs weighted RRF where each list has a weight.
///
/// Useful when you want to give more importance to one retrieval method.
/// Tie-breaking is the same as [`reciprocal_rank_fusion`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weighted_rrf(ranked_lists: &[(&[RankedResult], f64)], config: &RrfConfig) -> Vec<FusedResult> {
    let mut fused: Vec<FusedResult> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (list, weight) in ranked_lists {
        for (rank, item) in list.iter().enumerate() {
            // rank is 0-indexed, so we add 1 to make it 1-indexed
            let contribution = weight / (f64::from(config.k) + rank as f64 + 1.0);
            if let Some(&pos) = positions.get(item.id.as_str()) {
                fused[pos].score += contribution;
            } else {
                positions.insert(item.id.as_str(), fused.len());
                fused.push(FusedResult {
                    id: item.id.clone(),
                    score: contribution,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal scores
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(ids: &[&str]) -> Vec<RankedResult> {
        ids.iter()
            .map(|id| RankedResult::new(*id, format!("content of {id}"), 0.0))
            .collect()
    }

    #[test]
    fn test_rrf_single_list() {
        let results = reciprocal_rank_fusion(&[&list(&["a", "b", "c"])], &RrfConfig::default());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "a");
        assert!(results[0].score > results[1].score);
        assert!(results[1].score > results[2].score);
    }

    #[test]
    fn test_rrf_swapped_lists_tie_in_first_seen_order() {
        let a = list(&["x", "y"]);
        let b = list(&["y", "x"]);

        let results = reciprocal_rank_fusion(&[&a, &b], &RrfConfig::default());

        let expected = 1.0 / 61.0 + 1.0 / 62.0;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "x");
        assert_eq!(results[1].id, "y");
        assert!((results[0].score - expected).abs() < 1e-12);
        assert!((results[1].score - expected).abs() < 1e-12);

        // Reversing the input lists flips the first-seen order
        let reversed = reciprocal_rank_fusion(&[&b, &a], &RrfConfig::default());
        assert_eq!(reversed[0].id, "y");
    }

    #[test]
    fn test_rrf_single_versus_both_lists() {
        let a = list(&["shared", "only_a"]);
        let b = list(&["shared"]);

        let results = reciprocal_rank_fusion(&[&a, &b], &RrfConfig::default());

        let shared = results.iter().find(|r| r.id == "shared").unwrap();
        let only_a = results.iter().find(|r| r.id == "only_a").unwrap();
        assert!((shared.score - 2.0 / 61.0).abs() < 1e-12);
        assert!((only_a.score - 1.0 / 62.0).abs() < 1e-12);
    }

    #[test]
    fn test_rrf_disjoint_lists() {
        let results =
            reciprocal_rank_fusion(&[&list(&["a", "b"]), &list(&["c", "d"])], &RrfConfig::default());

        assert_eq!(results.len(), 4);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_rrf_empty_lists() {
        let empty: Vec<RankedResult> = Vec::new();
        assert!(reciprocal_rank_fusion(&[&empty], &RrfConfig::default()).is_empty());
        assert!(reciprocal_rank_fusion(&[], &RrfConfig::default()).is_empty());
    }

    #[test]
    fn test_rrf_k_parameter() {
        let items = list(&["a", "b"]);
        let results_low = reciprocal_rank_fusion(&[&items], &RrfConfig::new(1));
        let results_high = reciprocal_rank_fusion(&[&items], &RrfConfig::new(100));

        // With low k, score difference between ranks is larger
        let diff_low = results_low[0].score - results_low[1].score;
        let diff_high = results_high[0].score - results_high[1].score;
        assert!(diff_low > diff_high);
    }

    #[test]
    fn test_weighted_rrf() {
        let a = list(&["a", "b"]);
        let b = list(&["b", "a"]);

        let results = weighted_rrf(&[(&a, 1.0), (&b, 2.0)], &RrfConfig::default());

        // b leads the higher-weighted list
        assert_eq!(results[0].id, "b");
    }

    proptest! {
        #[test]
        fn prop_every_id_survives(ids_a in proptest::collection::vec("[a-f]", 0..6), ids_b in proptest::collection::vec("[a-f]", 0..6)) {
            let a: Vec<RankedResult> = ids_a.iter().map(|id| RankedResult::new(id.clone(), "", 0.0)).collect();
            let b: Vec<RankedResult> = ids_b.iter().map(|id| RankedResult::new(id.clone(), "", 0.0)).collect();
            let fused = reciprocal_rank_fusion(&[&a, &b], &RrfConfig::default());

            for id in ids_a.iter().chain(ids_b.iter()) {
                prop_assert!(fused.iter().any(|r| &r.id == id));
            }
            for pair in fused.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
