//! Anomaly scores and their mapping onto classifier results

use edgefuse_core::ClassifierResult;
use serde::{Deserialize, Serialize};

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    /// Normalised score in `(0, 1]`; higher is more anomalous
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    /// Create a new anomaly score
    pub fn new(score: f64, avg_path_length: f64, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Check if score indicates an anomaly
    pub fn is_anomaly(&self, threshold: f64) -> bool {
        self.score > threshold
    }

    /// Classifier verdict at `threshold`
    ///
    /// Confidence is the score itself for an anomaly and its complement for
    /// a normal reading, so a score of 0.95 yields a 0.95-confident flag.
    pub fn to_result(&self, threshold: f64) -> ClassifierResult {
        if self.is_anomaly(threshold) {
            ClassifierResult::anomalous(self.score)
        } else {
            ClassifierResult::normal(1.0 - self.score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        let score = AnomalyScore::new(0.6, 4.0, 100);
        assert!(!score.is_anomaly(0.6));
        assert!(score.is_anomaly(0.59));
    }

    #[test]
    fn confidence_follows_verdict() {
        let high = AnomalyScore::new(0.9, 2.0, 10).to_result(0.6);
        assert!(high.is_anomalous);
        assert!((high.confidence - 0.9).abs() < 1e-12);

        let low = AnomalyScore::new(0.3, 9.0, 10).to_result(0.6);
        assert!(!low.is_anomalous);
        assert!((low.confidence - 0.7).abs() < 1e-12);
    }
}
