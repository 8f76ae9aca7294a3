//! Pre-trained Classifier Backends for Edge Devices
//!
//! ## Overview
//!
//! Models are trained offline on historical sensor data and exported as
//! JSON. This crate evaluates those exports on the node and plugs them into
//! the pipeline through [`edgefuse_core::Classifier`]. Nothing here trains
//! or updates a model.
//!
//! ```text
//!  Reading ──► FeatureVector ──► StandardScaler ──► model ──► ClassifierResult
//!                                                     │
//!                              ┌──────────────────────┴─────────────┐
//!                      IsolationForestModel                  LogisticModel
//!                   score = 2^(-E[h(x)] / c(n))           p = σ(w·x + b)
//! ```
//!
//! ## Why Isolation Forest?
//!
//! Anomalies are few and different, so random axis-aligned splits isolate
//! them in fewer steps than normal points. The average path length over the
//! forest, normalised by the expected path length `c(n)` of an unsuccessful
//! BST search, gives a score in `(0, 1]`:
//!
//! - close to 1: isolated quickly, anomalous
//! - well below 0.5: deep in the data, normal
//!
//! Evaluation only walks the trees, so scoring a reading costs
//! `O(trees × depth)` with no allocation.
//!
//! ## Model Files
//!
//! A [`ModelBundle`] holds the scaler and one model:
//!
//! ```json
//! {
//!   "scaler": { "mean": [540.0, 665.0, 15.5, 0.06, 2400.0],
//!               "scale": [12.0, 15.0, 0.6, 0.025, 60.0] },
//!   "model": {
//!     "type": "isolation_forest",
//!     "max_samples": 256,
//!     "threshold": 0.6,
//!     "trees": [ { "nodes": [
//!       { "type": "internal", "feature": 0, "threshold": 1.2, "left": 1, "right": 2 },
//!       { "type": "leaf", "size": 240 },
//!       { "type": "leaf", "size": 16 }
//!     ] } ]
//!   }
//! }
//! ```
//!
//! Trees are stored in pre-order: children always come after their parent.
//! A sample goes left when `x[feature] <= threshold`.
//!
//! ## Degrading Gracefully
//!
//! [`ModelBundle::load_adapter`] never fails. A missing or broken model
//! file yields an unavailable adapter and the pipeline keeps running on
//! rules alone.
//!
//! ```rust
//! use edgefuse_core::{EdgeConfig, EdgePipeline};
//! use edgefuse_ml::ModelBundle;
//!
//! let adapter = ModelBundle::load_adapter("models/anomaly_detector.json");
//! let pipeline = EdgePipeline::new(EdgeConfig::default()).with_classifier_adapter(adapter);
//! # let _ = pipeline;
//! ```

#[macro_use]
mod macros;

pub mod forest;
pub mod logistic;
pub mod model;
pub mod node;
pub mod scaler;
pub mod scoring;
pub mod tree;

pub use forest::IsolationForestModel;
pub use logistic::LogisticModel;
pub use model::{ModelBundle, ModelKind};
pub use node::{c_factor, Node};
pub use scaler::StandardScaler;
pub use scoring::AnomalyScore;
pub use tree::IsolationTree;

use edgefuse_core::EdgeError;
use thiserror_no_std::Error;

/// Result type for model loading
pub type MlResult<T> = Result<T, MlError>;

/// Errors raised while loading or validating a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MlError {
    /// Model file could not be read
    #[error("Model file unreadable: {reason}")]
    Io {
        /// Underlying I/O error
        reason: String,
    },

    /// Model file is not valid JSON for the expected layout
    #[error("Model parse error: {reason}")]
    Parse {
        /// Underlying decode error
        reason: String,
    },

    /// A vector in the model has the wrong number of features
    #[error("Feature mismatch: expected {expected}, found {found}")]
    FeatureMismatch {
        /// Features the pipeline supplies
        expected: usize,
        /// Features the model declares
        found: usize,
    },

    /// Model structure is inconsistent
    #[error("Invalid model: {reason}")]
    InvalidModel {
        /// What was wrong with the model
        reason: String,
    },
}

impl MlError {
    /// Shorthand for an `InvalidModel` error
    pub fn invalid_model(reason: impl Into<String>) -> Self {
        Self::InvalidModel { reason: reason.into() }
    }
}

impl From<serde_json::Error> for MlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse { reason: err.to_string() }
    }
}

impl From<std::io::Error> for MlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io { reason: err.to_string() }
    }
}

impl From<MlError> for EdgeError {
    fn from(err: MlError) -> Self {
        EdgeError::invalid_config(err.to_string())
    }
}
