//! Weighted ranking of evaluated runs.

use serde::{Deserialize, Serialize};

/// Weights of the combined ranking score
/// `time / seconds + faithfulness × f + relevancy × r`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the inverse running time.
    pub time: f64,
    /// Weight of the faithfulness score.
    pub faithfulness: f64,
    /// Weight of the relevancy score.
    pub relevancy: f64,
}

/// Weights for ranking strategies.
pub const STRATEGY_WEIGHTS: ScoreWeights = ScoreWeights {
    time: 0.2,
    faithfulness: 0.4,
    relevancy: 0.4,
};

/// Weights for ranking chunk sizes.
pub const SWEEP_WEIGHTS: ScoreWeights = ScoreWeights {
    time: 0.3,
    faithfulness: 0.4,
    relevancy: 0.3,
};

impl ScoreWeights {
    /// Combined score. The time term is 0 when no time was measured.
    #[must_use]
    pub fn combine(&self, seconds: f64, faithfulness: f64, relevancy: f64) -> f64 {
        let speed = if seconds > 0.0 { self.time / seconds } else { 0.0 };
        speed + self.faithfulness * faithfulness + self.relevancy * relevancy
    }
}

/// Index of the highest-scoring item; the first wins ties.
pub(crate) fn best_index(scores: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.into_iter().enumerate() {
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_combine() {
        let score = STRATEGY_WEIGHTS.combine(2.0, 0.5, 1.0);
        assert!((score - (0.1 + 0.2 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_time_drops_speed_term() {
        let score = SWEEP_WEIGHTS.combine(0.0, 1.0, 1.0);
        assert!((score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_best_index_first_wins_ties() {
        assert_eq!(best_index([0.5, 0.9, 0.9, 0.1]), Some(1));
        assert_eq!(best_index(Vec::<f64>::new()), None);
    }

    proptest! {
        #[test]
        fn prop_faster_never_ranks_lower(t in 0.01f64..100.0, f in 0.0f64..1.0, r in 0.0f64..1.0) {
            let slow = STRATEGY_WEIGHTS.combine(t * 2.0, f, r);
            let fast = STRATEGY_WEIGHTS.combine(t, f, r);
            prop_assert!(fast >= slow);
        }
    }
}
