//! Classifier adapter
//!
//! ## Overview
//!
//! The pipeline can consult a pre-trained classifier in addition to its
//! rules. [`ClassifierAdapter`] wraps an optional [`Classifier`] backend and
//! gives the pipeline a uniform contract:
//!
//! ```text
//! Reading ──► FeatureVector [t1, t2, p, v, rpm] ──► backend ──► ClassifierResult
//!                                                     │
//!                                          none loaded └──► ModelUnavailable
//! ```
//!
//! A missing backend is not a failure of the node. The pipeline falls back
//! to rules-only detection and keeps going.

use serde::{Deserialize, Serialize};

use crate::constants::detection::FEATURE_CHANNELS;
use crate::errors::{EdgeError, EdgeResult};
use crate::reading::Reading;
use crate::traits::Classifier;

/// Number of features a classifier receives
pub const FEATURE_COUNT: usize = FEATURE_CHANNELS.len();

/// Outcome of scoring one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    /// Whether the backend judged the reading anomalous
    pub is_anomalous: bool,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
}

impl ClassifierResult {
    /// Create a result, clamping confidence into `[0, 1]`
    pub fn new(is_anomalous: bool, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self { is_anomalous, confidence }
    }

    /// Normal reading with the given confidence
    pub fn normal(confidence: f64) -> Self {
        Self::new(false, confidence)
    }

    /// Anomalous reading with the given confidence
    pub fn anomalous(confidence: f64) -> Self {
        Self::new(true, confidence)
    }
}

/// Fixed-order feature vector: temperature_1, temperature_2, pressure,
/// vibration, rpm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Extract features from a reading; absent channels contribute 0.0
    pub fn from_reading(reading: &Reading) -> Self {
        let mut features = [0.0; FEATURE_COUNT];
        for (slot, channel) in features.iter_mut().zip(FEATURE_CHANNELS.iter()) {
            *slot = reading.get(channel).unwrap_or(0.0);
        }
        Self(features)
    }

    /// Features as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Feature by position
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

/// Uniform front for an optional classifier backend
pub struct ClassifierAdapter {
    backend: Option<Box<dyn Classifier>>,
}

impl ClassifierAdapter {
    /// Adapter with a loaded backend
    pub fn new(backend: Box<dyn Classifier>) -> Self {
        Self { backend: Some(backend) }
    }

    /// Adapter with no model loaded
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    /// Whether a backend is loaded
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend name, if any
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(Classifier::name)
    }

    /// Score a feature vector
    ///
    /// Fails with `ModelUnavailable` when no backend is loaded. Backend
    /// confidences are clamped into `[0, 1]`.
    pub fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult> {
        let backend = self.backend.as_ref().ok_or(EdgeError::ModelUnavailable)?;
        let raw = backend.score(features)?;
        Ok(ClassifierResult::new(raw.is_anomalous, raw.confidence))
    }

    /// Score a reading
    pub fn score_reading(&self, reading: &Reading) -> EdgeResult<ClassifierResult> {
        self.score(&FeatureVector::from_reading(reading))
    }
}

impl Default for ClassifierAdapter {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl core::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("backend", &self.backend_name())
            .finish()
    }
}
