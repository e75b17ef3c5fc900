//! Running classification metrics.
//!
//! The learner keeps a single [`ConfusionMatrix`] for the lifetime of its
//! consume loop and derives a [`MetricSnapshot`] from it after every
//! prediction. Counts are cumulative and never reset, so snapshots are
//! position-dependent: reordering the event stream changes them.

use serde::{Deserialize, Serialize};

use crate::record::Sentiment;

/// Cumulative (true label, predicted label) counts over the binary label set.
///
/// Counts are monotonically non-decreasing and sum to the number of
/// predictions recorded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    // counts[true][predicted], indexed by wire encoding.
    counts: [[u64; 2]; 2],
}

impl ConfusionMatrix {
    /// Creates an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one (true, predicted) observation.
    pub fn update(&mut self, y_true: Sentiment, y_pred: Sentiment) {
        self.counts[y_true.as_u8() as usize][y_pred.as_u8() as usize] += 1;
    }

    /// The count for a specific (true, predicted) cell.
    #[must_use]
    pub const fn count(&self, y_true: Sentiment, y_pred: Sentiment) -> u64 {
        self.counts[y_true.as_u8() as usize][y_pred.as_u8() as usize]
    }

    /// Total number of predictions recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Precision with respect to `positive`: TP / (TP + FP).
    ///
    /// Evaluates to 0.0 while no instance has been predicted as `positive`.
    #[must_use]
    pub fn precision(&self, positive: Sentiment) -> f64 {
        let tp = self.count(positive, positive);
        let fp = self.count(positive.other(), positive);
        safe_ratio(tp, tp + fp)
    }

    /// Recall with respect to `positive`: TP / (TP + FN).
    ///
    /// Evaluates to 0.0 while no instance of `positive` has been observed.
    #[must_use]
    pub fn recall(&self, positive: Sentiment) -> f64 {
        let tp = self.count(positive, positive);
        let fn_ = self.count(positive, positive.other());
        safe_ratio(tp, tp + fn_)
    }
}

#[allow(clippy::cast_precision_loss)]
fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Precision and recall at a point in the stream.
///
/// This is the payload published to the metrics topic after each prediction.
/// Both values lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Precision with respect to the configured positive class.
    pub precision: f64,

    /// Recall with respect to the configured positive class.
    pub recall: f64,
}

impl MetricSnapshot {
    /// Derives a snapshot from the matrix's current counts.
    #[must_use]
    pub fn from_matrix(matrix: &ConfusionMatrix, positive: Sentiment) -> Self {
        Self {
            precision: matrix.precision(positive),
            recall: matrix.recall(positive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matrix_yields_zero_metrics() {
        let matrix = ConfusionMatrix::new();
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.precision(Sentiment::Negative), 0.0);
        assert_eq!(matrix.recall(Sentiment::Negative), 0.0);
    }

    #[test]
    fn counts_accumulate_and_sum_to_total() {
        let mut matrix = ConfusionMatrix::new();
        matrix.update(Sentiment::Negative, Sentiment::Negative);
        matrix.update(Sentiment::Negative, Sentiment::Positive);
        matrix.update(Sentiment::Positive, Sentiment::Positive);
        matrix.update(Sentiment::Positive, Sentiment::Positive);

        assert_eq!(matrix.count(Sentiment::Negative, Sentiment::Negative), 1);
        assert_eq!(matrix.count(Sentiment::Negative, Sentiment::Positive), 1);
        assert_eq!(matrix.count(Sentiment::Positive, Sentiment::Positive), 2);
        assert_eq!(matrix.total(), 4);
    }

    #[test]
    fn counts_are_monotone_under_updates() {
        let mut matrix = ConfusionMatrix::new();
        let mut previous_total = 0;
        for i in 0..20u8 {
            let y_true = Sentiment::try_from(i % 2).unwrap();
            let y_pred = Sentiment::try_from((i / 2) % 2).unwrap();
            let before = matrix.count(y_true, y_pred);
            matrix.update(y_true, y_pred);
            assert_eq!(matrix.count(y_true, y_pred), before + 1);
            assert!(matrix.total() > previous_total);
            previous_total = matrix.total();
        }
    }

    #[test]
    fn precision_and_recall_match_hand_computation() {
        // true=Neg pred=Neg: 3 (TP for positive class Negative)
        // true=Pos pred=Neg: 1 (FP)
        // true=Neg pred=Pos: 2 (FN)
        let mut matrix = ConfusionMatrix::new();
        for _ in 0..3 {
            matrix.update(Sentiment::Negative, Sentiment::Negative);
        }
        matrix.update(Sentiment::Positive, Sentiment::Negative);
        matrix.update(Sentiment::Negative, Sentiment::Positive);
        matrix.update(Sentiment::Negative, Sentiment::Positive);

        assert!((matrix.precision(Sentiment::Negative) - 0.75).abs() < 1e-12);
        assert!((matrix.recall(Sentiment::Negative) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn metrics_stay_in_unit_interval() {
        let mut matrix = ConfusionMatrix::new();
        for i in 0..50u8 {
            let y_true = Sentiment::try_from(i % 2).unwrap();
            let y_pred = Sentiment::try_from((i / 3) % 2).unwrap();
            matrix.update(y_true, y_pred);
            for positive in Sentiment::ALL {
                let snapshot = MetricSnapshot::from_matrix(&matrix, positive);
                assert!((0.0..=1.0).contains(&snapshot.precision));
                assert!((0.0..=1.0).contains(&snapshot.recall));
            }
        }
    }

    #[test]
    fn snapshot_serializes_to_wire_schema() {
        let snapshot = MetricSnapshot {
            precision: 0.55,
            recall: 0.8,
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json, serde_json::json!({"precision": 0.55, "recall": 0.8}));
    }
}
