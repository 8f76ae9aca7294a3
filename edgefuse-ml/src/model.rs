//! Model bundles: scaler plus model, loaded from one JSON file

use std::path::Path;

use serde::{Deserialize, Serialize};

use edgefuse_core::{Classifier, ClassifierAdapter, ClassifierResult, EdgeResult, FeatureVector};

use crate::forest::IsolationForestModel;
use crate::logistic::LogisticModel;
use crate::scaler::StandardScaler;
use crate::MlResult;

/// The model inside a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    /// Unsupervised isolation forest
    IsolationForest(IsolationForestModel),
    /// Supervised logistic regression
    Logistic(LogisticModel),
}

impl ModelKind {
    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            ModelKind::IsolationForest(forest) => forest,
            ModelKind::Logistic(logistic) => logistic,
        }
    }
}

/// A deployable classifier: standardisation followed by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Feature standardisation applied before scoring
    #[serde(default)]
    pub scaler: StandardScaler,
    /// The model itself
    pub model: ModelKind,
}

impl ModelBundle {
    /// Bundle from parts, validated
    pub fn new(scaler: StandardScaler, model: ModelKind) -> MlResult<Self> {
        let bundle = Self { scaler, model };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Parse and validate a JSON bundle
    pub fn from_json_str(json: &str) -> MlResult<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read, parse and validate a bundle file
    pub fn from_path(path: impl AsRef<Path>) -> MlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check scaler and model
    pub fn validate(&self) -> MlResult<()> {
        self.scaler.validate()?;
        match &self.model {
            ModelKind::IsolationForest(forest) => forest.validate(),
            ModelKind::Logistic(logistic) => logistic.validate(),
        }
    }

    /// Adapter for a bundle file, unavailable if it cannot be loaded
    ///
    /// A missing file is normal on nodes without a deployed model and is
    /// logged at info; a file that exists but does not load is a warning.
    pub fn load_adapter(path: impl AsRef<Path>) -> ClassifierAdapter {
        let path = path.as_ref();
        if !path.exists() {
            log_info!("No classifier model at {}, running rules only", path.display());
            return ClassifierAdapter::unavailable();
        }

        match Self::from_path(path) {
            Ok(bundle) => {
                log_info!("Loaded {} classifier from {}", bundle.name(), path.display());
                bundle.into_adapter()
            }
            Err(e) => {
                log_warn!("Ignoring classifier model {}: {}", path.display(), e);
                ClassifierAdapter::unavailable()
            }
        }
    }

    /// Wrap this bundle for the pipeline
    pub fn into_adapter(self) -> ClassifierAdapter {
        ClassifierAdapter::new(Box::new(self))
    }
}

impl Classifier for ModelBundle {
    fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult> {
        let scaled = self.scaler.transform(features);
        self.model.as_classifier().score(&scaled)
    }

    fn name(&self) -> &str {
        self.model.as_classifier().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use edgefuse_core::EdgeError;

    use crate::MlError;

    const FOREST: &str = r#"{
        "scaler": { "mean": [540.0, 665.0, 15.0, 0.05, 2400.0],
                    "scale": [10.0, 10.0, 1.0, 0.01, 50.0] },
        "model": {
            "type": "isolation_forest",
            "max_samples": 256,
            "threshold": 0.6,
            "trees": [
                { "nodes": [
                    { "type": "internal", "feature": 3, "threshold": 3.0, "left": 1, "right": 2 },
                    { "type": "leaf", "size": 250 },
                    { "type": "leaf", "size": 1 }
                ] },
                { "nodes": [
                    { "type": "internal", "feature": 0, "threshold": 3.0, "left": 1, "right": 2 },
                    { "type": "internal", "feature": 3, "threshold": 3.0, "left": 3, "right": 4 },
                    { "type": "leaf", "size": 1 },
                    { "type": "leaf", "size": 240 },
                    { "type": "leaf", "size": 2 }
                ] }
            ]
        }
    }"#;

    #[test]
    fn scales_before_scoring() {
        let bundle = ModelBundle::from_json_str(FOREST).unwrap();
        assert_eq!(bundle.name(), "isolation_forest");

        // Raw vibration 0.05 standardises to 0, deep in both trees
        let nominal = bundle.score(&FeatureVector([540.0, 665.0, 15.0, 0.05, 2400.0])).unwrap();
        assert!(!nominal.is_anomalous);

        // Raw vibration 0.12 standardises to 7, isolated near the root
        let shaking = bundle.score(&FeatureVector([540.0, 665.0, 15.0, 0.12, 2400.0])).unwrap();
        assert!(shaking.is_anomalous);
        assert!(shaking.confidence > 0.8);
    }

    #[test]
    fn logistic_bundle_without_scaler() {
        let json = r#"{
            "model": { "type": "logistic", "coefficients": [0, 0, 0, 100, 0], "intercept": -10 }
        }"#;
        let bundle = ModelBundle::from_json_str(json).unwrap();
        assert_eq!(bundle.scaler, StandardScaler::identity());
        assert_eq!(bundle.name(), "logistic");

        let result = bundle.score(&FeatureVector([0.0, 0.0, 0.0, 0.2, 0.0])).unwrap();
        assert!(result.is_anomalous);
    }

    #[test]
    fn missing_file_degrades_to_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ModelBundle::load_adapter(dir.path().join("absent.json"));
        assert!(!adapter.is_available());
        assert_eq!(
            adapter.score(&FeatureVector([0.0; 5])),
            Err(EdgeError::ModelUnavailable)
        );
    }

    #[test]
    fn broken_file_degrades_to_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "model": {{ "type": "logistic", "coefficients": [1.0], "intercept": 0 }} }}"#)
            .unwrap();

        assert_eq!(
            ModelBundle::from_path(file.path()),
            Err(MlError::FeatureMismatch { expected: 5, found: 1 })
        );
        assert!(!ModelBundle::load_adapter(file.path()).is_available());
    }

    #[test]
    fn valid_file_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FOREST.as_bytes()).unwrap();

        let adapter = ModelBundle::load_adapter(file.path());
        assert!(adapter.is_available());
        assert_eq!(adapter.backend_name(), Some("isolation_forest"));
    }

    #[test]
    fn unknown_model_type_is_a_parse_error() {
        let err = ModelBundle::from_json_str(r#"{ "model": { "type": "svm" } }"#).unwrap_err();
        assert!(matches!(err, MlError::Parse { .. }));
    }
}
