//! Logistic anomaly model
//!
//! A linear model trained on labelled failure data: `p = σ(w·x + b)` is the
//! probability that a reading belongs to a failing machine.

use serde::{Deserialize, Serialize};

use edgefuse_core::{
    classifier::FEATURE_COUNT, Classifier, ClassifierResult, EdgeResult, FeatureVector,
};

use crate::{MlError, MlResult};

fn default_threshold() -> f64 {
    0.5
}

/// Pre-trained logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One weight per feature
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
    /// Probability above which a reading is flagged
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    /// Build a model and check it
    pub fn new(coefficients: Vec<f64>, intercept: f64, threshold: f64) -> MlResult<Self> {
        let model = Self { coefficients, intercept, threshold };
        model.validate()?;
        Ok(model)
    }

    /// Check lengths and values
    pub fn validate(&self) -> MlResult<()> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(MlError::FeatureMismatch {
                expected: FEATURE_COUNT,
                found: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(MlError::invalid_model("logistic weights must be finite"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MlError::invalid_model(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Probability of the anomalous class
    pub fn probability(&self, sample: &[f64]) -> f64 {
        let z: f64 = self
            .coefficients
            .iter()
            .zip(sample)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticModel {
    fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult> {
        let p = self.probability(features.as_slice());
        if p > self.threshold {
            Ok(ClassifierResult::anomalous(p))
        } else {
            Ok(ClassifierResult::normal(1.0 - p))
        }
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vibration_model() -> LogisticModel {
        // Only vibration (feature 3) matters
        LogisticModel::new(vec![0.0, 0.0, 0.0, 4.0, 0.0], -4.0, 0.5).unwrap()
    }

    #[test]
    fn probability_is_sigmoid() {
        let model = vibration_model();
        assert!((model.probability(&[0.0, 0.0, 0.0, 1.0, 0.0]) - 0.5).abs() < 1e-12);
        assert!(model.probability(&[0.0, 0.0, 0.0, 3.0, 0.0]) > 0.99);
        assert!(model.probability(&[0.0; 5]) < 0.02);
    }

    #[test]
    fn classifies_around_threshold() {
        let model = vibration_model();

        let high = model.score(&FeatureVector([0.0, 0.0, 0.0, 3.0, 0.0])).unwrap();
        assert!(high.is_anomalous);
        assert!(high.confidence > 0.99);

        // Exactly at the threshold is not anomalous
        let edge = model.score(&FeatureVector([0.0, 0.0, 0.0, 1.0, 0.0])).unwrap();
        assert!(!edge.is_anomalous);
        assert!((edge.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_wrong_width() {
        assert_eq!(
            LogisticModel::new(vec![1.0; 4], 0.0, 0.5),
            Err(MlError::FeatureMismatch { expected: 5, found: 4 })
        );
        assert!(LogisticModel::new(vec![1.0; 5], f64::INFINITY, 0.5).is_err());
    }
}
