//! Extension points of the edge pipeline
//!
//! Two seams let deployments plug in their own pieces without touching the
//! decision logic:
//!
//! - [`Classifier`]: a scoring backend for feature vectors (see `edgefuse-ml`)
//! - [`ActuatorSink`]: wherever actuator commands physically go
//!
//! Timing is abstracted through [`TimeSource`], re-exported here so that
//! implementors only need one import.

use crate::classifier::{ClassifierResult, FeatureVector};
use crate::errors::EdgeResult;
use crate::fusion::{ActuatorAction, ActuatorCommand};
use crate::reading::NodeId;

pub use crate::time::TimeSource;

/// A pre-trained anomaly classifier
///
/// Implementations must be deterministic: the same features produce the
/// same result. Confidence values outside `[0, 1]` are clamped by the
/// adapter, so backends may return raw probabilities.
pub trait Classifier: Send {
    /// Score one feature vector
    fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "classifier"
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn score(&self, features: &FeatureVector) -> EdgeResult<ClassifierResult> {
        (**self).score(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Destination for actuator commands
pub trait ActuatorSink {
    /// Deliver one command to one actuator
    fn command(&mut self, actuator_id: NodeId, action: ActuatorAction) -> EdgeResult<()>;
}

/// Collects commands in memory, in delivery order
impl ActuatorSink for Vec<ActuatorCommand> {
    fn command(&mut self, actuator_id: NodeId, action: ActuatorAction) -> EdgeResult<()> {
        self.push(ActuatorCommand::new(actuator_id, action));
        Ok(())
    }
}
