//! Feature standardisation
//!
//! Models are trained on standardised features, `(x - mean) / scale`, so the
//! same transform must run on the node before scoring. The parameters come
//! straight from the training export.

use serde::{Deserialize, Serialize};

use edgefuse_core::{classifier::FEATURE_COUNT, FeatureVector};

use crate::{MlError, MlResult};

/// Per-feature mean and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Training mean per feature
    pub mean: Vec<f64>,
    /// Training standard deviation per feature
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scaler from explicit parameters
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> MlResult<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Scaler that leaves features untouched
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    /// Check lengths and values
    ///
    /// A zero scale would divide by zero; exports must already have replaced
    /// constant features' scale with 1.
    pub fn validate(&self) -> MlResult<()> {
        for values in [&self.mean, &self.scale] {
            if values.len() != FEATURE_COUNT {
                return Err(MlError::FeatureMismatch {
                    expected: FEATURE_COUNT,
                    found: values.len(),
                });
            }
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(MlError::invalid_model("scaler mean must be finite"));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(MlError::invalid_model("scaler scale must be finite and non-zero"));
        }
        Ok(())
    }

    /// Standardise a feature vector
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = features.0;
        for ((value, mean), scale) in scaled.iter_mut().zip(&self.mean).zip(&self.scale) {
            *value = (*value - mean) / scale;
        }
        FeatureVector(scaled)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::identity()
    }
}
