//! Decision Fusion
//!
//! ## Overview
//!
//! Fusion turns the findings of one reading into the node's decision:
//!
//! ```text
//! rule anomalies ─────────────┐
//!                             ├─► anomalies ─┬─► actuator commands
//! classifier result ──(flag)──┘              │
//!                                            └─► should_forward
//!                         cycle % heartbeat ─────┘
//! ```
//!
//! ## Rules
//!
//! 1. Rule anomalies keep their order; a classifier flag, if any, is appended
//!    last. The flag is `Critical` when confidence exceeds
//!    `critical_confidence` (0.8), otherwise `Warning`.
//! 2. A reading is forwarded when it carries any anomaly, or on every
//!    `heartbeat_interval`-th cycle so quiet nodes stay visible.
//! 3. Commands follow [`ActuatorAction::for_anomaly`], batched according to
//!    [`CommandBatching`].
//!
//! Fusion is stateless. The same inputs always produce the same decision.

mod command;

pub use command::{actuator_topic, ActuatorAction, ActuatorCommand, CommandBatching};

use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, Severity};
use crate::classifier::ClassifierResult;
use crate::constants::forwarding::{CLASSIFIER_CRITICAL_CONFIDENCE, DEFAULT_HEARTBEAT_INTERVAL};
use crate::reading::{NodeId, Reading};

/// Parameters of decision fusion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionPolicy {
    /// Forward every N-th cycle even without anomalies
    pub heartbeat_interval: u64,
    /// Classifier confidence above which its flag is critical
    pub critical_confidence: f64,
    /// Command batching mode
    pub batching: CommandBatching,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            critical_confidence: CLASSIFIER_CRITICAL_CONFIDENCE,
            batching: CommandBatching::PerAnomaly,
        }
    }
}

/// Outcome of processing one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Source node
    pub node_id: NodeId,
    /// Source cycle
    pub cycle: u64,
    /// Whether the reading goes to the cloud
    pub should_forward: bool,
    /// Commands for the node's actuators
    pub actuator_commands: Vec<ActuatorCommand>,
    /// Rule anomalies first, classifier flag last
    pub anomalies: Vec<Anomaly>,
}

impl Decision {
    /// First anomaly, used as the reason for actuation
    pub fn primary(&self) -> Option<&Anomaly> {
        self.anomalies.first()
    }

    /// Highest severity among the anomalies
    pub fn max_severity(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }

    /// Whether anything was found
    pub fn has_anomaly(&self) -> bool {
        !self.anomalies.is_empty()
    }

    /// Forwarded only because of the heartbeat cadence
    pub fn is_heartbeat(&self) -> bool {
        self.should_forward && self.anomalies.is_empty()
    }
}

/// Combines rule findings and classifier output into a decision
#[derive(Debug, Clone, Default)]
pub struct DecisionFusion {
    policy: FusionPolicy,
}

impl DecisionFusion {
    /// Create a fusion stage with a policy
    pub fn new(policy: FusionPolicy) -> Self {
        Self { policy }
    }

    /// Active policy
    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    /// Fuse the findings for one reading
    pub fn fuse(
        &self,
        reading: &Reading,
        mut anomalies: Vec<Anomaly>,
        classifier: Option<ClassifierResult>,
    ) -> Decision {
        if let Some(flag) = classifier.and_then(|result| self.classifier_flag(result)) {
            anomalies.push(flag);
        }

        let heartbeat = self.policy.heartbeat_interval.max(1);
        let should_forward = !anomalies.is_empty() || reading.cycle % heartbeat == 0;
        let actuator_commands = self.policy.batching.commands(reading.node_id, &anomalies);

        Decision {
            node_id: reading.node_id,
            cycle: reading.cycle,
            should_forward,
            actuator_commands,
            anomalies,
        }
    }

    fn classifier_flag(&self, result: ClassifierResult) -> Option<Anomaly> {
        if !result.is_anomalous {
            return None;
        }

        let severity = if result.confidence > self.policy.critical_confidence {
            Severity::Critical
        } else {
            Severity::Warning
        };

        Some(Anomaly::classifier_flag(
            result.confidence,
            self.policy.critical_confidence,
            severity,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyKind;

    fn reading(cycle: u64) -> Reading {
        Reading::builder(3, cycle).measurement("rpm", 2400.0).build()
    }

    #[test]
    fn heartbeat_cadence() {
        let fusion = DecisionFusion::default();
        let forwarded: Vec<u64> = (1..=30)
            .filter(|&cycle| fusion.fuse(&reading(cycle), Vec::new(), None).should_forward)
            .collect();
        assert_eq!(forwarded, vec![10, 20, 30]);

        let beat = fusion.fuse(&reading(20), Vec::new(), None);
        assert!(beat.is_heartbeat());
        assert!(beat.actuator_commands.is_empty());
    }

    #[test]
    fn anomalies_always_forward() {
        let fusion = DecisionFusion::default();
        let anomaly = Anomaly::threshold_exceeded("rpm", 2500.0, 2450.0);
        let decision = fusion.fuse(&reading(7), vec![anomaly], None);

        assert!(decision.should_forward);
        assert!(!decision.is_heartbeat());
        assert_eq!(
            decision.actuator_commands,
            vec![ActuatorCommand::new(3, ActuatorAction::Alert)]
        );
    }

    #[test]
    fn classifier_flag_is_appended_last() {
        let fusion = DecisionFusion::default();
        let rule = Anomaly::threshold_exceeded("temperature_1", 560.0, 550.0);

        let decision = fusion.fuse(&reading(1), vec![rule], Some(ClassifierResult::anomalous(0.9)));
        assert_eq!(decision.anomalies.len(), 2);
        assert_eq!(decision.primary().map(|a| a.kind), Some(AnomalyKind::ThresholdExceeded));
        assert_eq!(decision.anomalies[1].kind, AnomalyKind::ClassifierFlag);
        assert_eq!(decision.anomalies[1].severity, Severity::Critical);
        assert_eq!(decision.max_severity(), Some(Severity::Critical));

        let mild = fusion.fuse(&reading(1), Vec::new(), Some(ClassifierResult::anomalous(0.8)));
        assert_eq!(mild.anomalies[0].severity, Severity::Warning);

        let normal = fusion.fuse(&reading(1), Vec::new(), Some(ClassifierResult::normal(0.95)));
        assert!(!normal.has_anomaly());
    }

    #[test]
    fn zero_heartbeat_is_treated_as_every_cycle() {
        let fusion = DecisionFusion::new(FusionPolicy {
            heartbeat_interval: 0,
            ..FusionPolicy::default()
        });
        assert!(fusion.fuse(&reading(3), Vec::new(), None).should_forward);
    }
}
