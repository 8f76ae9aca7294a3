//! Isolation Forest evaluation
//!
//! Combines the path lengths of every tree into one anomaly score:
//!
//! ```text
//! s(x, n) = 2^( -E[h(x)] / c(n) )
//! ```
//!
//! where `n` is the subsample size each tree was grown on. The forest flags
//! a reading when `s` is strictly above its exported `threshold`.

use serde::{Deserialize, Serialize};

use edgefuse_core::{
    classifier::FEATURE_COUNT, Classifier, ClassifierResult, EdgeResult, FeatureVector,
};

use crate::node::c_factor;
use crate::scoring::AnomalyScore;
use crate::tree::IsolationTree;
use crate::{MlError, MlResult};

/// Score above which a reading is anomalous when the export omits one
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 {
    DEFAULT_ANOMALY_THRESHOLD
}

/// A pre-trained isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestModel {
    /// Subsample size `n` each tree was grown on
    pub max_samples: usize,
    /// Score above which a reading is flagged
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// The trees
    pub trees: Vec<IsolationTree>,
}

impl IsolationForestModel {
    /// Build a forest from trees and check it
    pub fn new(max_samples: usize, threshold: f64, trees: Vec<IsolationTree>) -> MlResult<Self> {
        let model = Self { max_samples, threshold, trees };
        model.validate()?;
        Ok(model)
    }

    /// Parse and validate a JSON export
    pub fn from_json_str(json: &str) -> MlResult<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Check the forest is usable
    pub fn validate(&self) -> MlResult<()> {
        if self.trees.is_empty() {
            return Err(MlError::invalid_model("forest has no trees"));
        }
        if self.max_samples < 2 {
            return Err(MlError::invalid_model("max_samples must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MlError::invalid_model(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        for tree in &self.trees {
            tree.validate(FEATURE_COUNT)?;
        }
        Ok(())
    }

    /// Number of trees
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Anomaly score for one (already scaled) sample
    pub fn anomaly_score(&self, sample: &[f64]) -> AnomalyScore {
        let num_trees = self.trees.len();
        if num_trees == 0 {
            return AnomalyScore::new(0.0, 0.0, 0);
        }

        let total: f64 = self.trees.iter().map(|t| t.path_length(sample)).sum();
        let avg_path_length = total / num_trees as f64;
        let score = 2f64.powf(-avg_path_length / c_factor(self.max_samples));

        AnomalyScore::new(score, avg_path_length, num_trees)
    }

    /// Whether a sample scores above the threshold
    pub fn is_anomaly(&self, sample: &[f64]) -> bool {
        self.anomaly_score(sample).is_anomaly(self.threshold)
    }
}

impl Classifier for IsolationForestModel {
    fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult> {
        Ok(self.anomaly_score(features.as_slice()).to_result(self.threshold))
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    /// Every tree isolates `x0 > 3` in one step and buries the rest
    fn stump(split: f64) -> IsolationTree {
        IsolationTree::new(vec![
            Node::Internal { feature: 0, threshold: split, left: 1, right: 2 },
            Node::Leaf { size: 255 },
            Node::Leaf { size: 1 },
        ])
    }

    fn forest() -> IsolationForestModel {
        IsolationForestModel::new(256, 0.6, vec![stump(3.0), stump(3.5), stump(2.5)]).unwrap()
    }

    #[test]
    fn outlier_scores_higher() {
        let forest = forest();
        let normal = forest.anomaly_score(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        let outlier = forest.anomaly_score(&[10.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(outlier.num_trees, 3);
        assert_eq!(outlier.avg_path_length, 1.0);
        // 2^(-1 / c(256))
        assert!((outlier.score - 0.934).abs() < 1e-3);
        assert!(normal.score < 0.5);

        assert!(forest.is_anomaly(&[10.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(!forest.is_anomaly(&[0.0; 5]));
    }

    #[test]
    fn classifier_result_carries_confidence() {
        let forest = forest();
        let result = forest.score(&FeatureVector([10.0, 0.0, 0.0, 0.0, 0.0])).unwrap();
        assert!(result.is_anomalous);
        assert!(result.confidence > 0.9);
        assert_eq!(forest.name(), "isolation_forest");
    }

    #[test]
    fn rejects_unusable_forests() {
        assert!(IsolationForestModel::new(256, 0.6, Vec::new()).is_err());
        assert!(IsolationForestModel::new(1, 0.6, vec![stump(1.0)]).is_err());
        assert!(IsolationForestModel::new(256, 1.5, vec![stump(1.0)]).is_err());
    }

    #[test]
    fn threshold_defaults_when_absent() {
        let json = r#"{
            "max_samples": 16,
            "trees": [ { "nodes": [ { "type": "leaf", "size": 16 } ] } ]
        }"#;
        let forest = IsolationForestModel::from_json_str(json).unwrap();
        assert_eq!(forest.threshold, DEFAULT_ANOMALY_THRESHOLD);
        // A single leaf holding the whole subsample scores exactly 0.5
        let score = forest.anomaly_score(&[0.0; 5]);
        assert!((score.score - 0.5).abs() < 1e-12);
        assert!(!score.is_anomaly(forest.threshold));
    }
}
