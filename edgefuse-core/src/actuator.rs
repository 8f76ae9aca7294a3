//! Actuator registry
//!
//! ## Overview
//!
//! Every node has one actuator, addressed by the node id. An actuator is a
//! latch: [`ActuatorRegistry::activate`] turns it on and records why, and it
//! stays on until [`ActuatorRegistry::deactivate`] is called. Nothing turns
//! an actuator off automatically; real equipment has to be reset by someone.
//!
//! ```text
//!            activate              activate
//!   ┌─────┐ ─────────► ┌────┐ ◄──────────────┐
//!   │ Off │            │ On │ ───────────────┘ (count += 1, log += 1)
//!   └─────┘ ◄───────── └────┘
//!            deactivate
//! ```
//!
//! Repeated activation is not an error: every call increments the counter
//! and appends a log entry, whatever the prior state.
//!
//! ## Kinds
//!
//! Actuators are created lazily on first use. Their kind is assigned
//! round-robin by id: 1 → alarm system, 2 → cooling fan, 3 → emergency
//! valve, 4 → notification light, 5 → alarm system, and so on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::anomaly::Severity;
use crate::errors::EdgeResult;
use crate::fusion::ActuatorAction;
use crate::reading::NodeId;
use crate::time::{SystemTime, TimeSource, Timestamp};
use crate::traits::ActuatorSink;

/// On/off latch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActuatorState {
    /// Idle
    #[default]
    Off,
    /// Activated and not yet reset
    On,
}

/// Physical kind of an actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Audible alarm
    AlarmSystem,
    /// Cooling fan
    CoolingFan,
    /// Emergency shut-off valve
    EmergencyValve,
    /// Indicator light
    NotificationLight,
}

impl ActuatorKind {
    const ROTATION: [ActuatorKind; 4] = [
        ActuatorKind::AlarmSystem,
        ActuatorKind::CoolingFan,
        ActuatorKind::EmergencyValve,
        ActuatorKind::NotificationLight,
    ];

    /// Kind assigned to an actuator id
    pub fn for_id(actuator_id: NodeId) -> Self {
        let slot = (actuator_id.wrapping_sub(1) as usize) % Self::ROTATION.len();
        Self::ROTATION[slot]
    }

    /// Upper-case label
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActuatorKind::AlarmSystem => "ALARM_SYSTEM",
            ActuatorKind::CoolingFan => "COOLING_FAN",
            ActuatorKind::EmergencyValve => "EMERGENCY_VALVE",
            ActuatorKind::NotificationLight => "NOTIFICATION_LIGHT",
        }
    }
}

/// One entry of an actuator's activation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// When the activation happened
    pub timestamp: Timestamp,
    /// Why, usually the primary anomaly's explanation
    pub reason: String,
    /// Urgency of the triggering finding
    pub severity: Severity,
    /// What the actuator did, e.g. `COOLING_FAN_ACTIVATED`
    pub action: String,
}

/// A single actuator with its history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuator {
    id: NodeId,
    kind: ActuatorKind,
    state: ActuatorState,
    activation_count: u64,
    activation_log: Vec<ActivationRecord>,
}

impl Actuator {
    /// Create an idle actuator with its round-robin kind
    pub fn new(id: NodeId) -> Self {
        Self::with_kind(id, ActuatorKind::for_id(id))
    }

    /// Create an idle actuator of a specific kind
    pub fn with_kind(id: NodeId, kind: ActuatorKind) -> Self {
        Self {
            id,
            kind,
            state: ActuatorState::Off,
            activation_count: 0,
            activation_log: Vec::new(),
        }
    }

    fn activate(&mut self, timestamp: Timestamp, reason: &str, severity: Severity) -> &ActivationRecord {
        self.state = ActuatorState::On;
        self.activation_count += 1;

        let index = self.activation_log.len();
        self.activation_log.push(ActivationRecord {
            timestamp,
            reason: reason.to_string(),
            severity,
            action: format!("{}_ACTIVATED", self.kind.as_str()),
        });
        &self.activation_log[index]
    }

    fn deactivate(&mut self) {
        if self.state == ActuatorState::On {
            self.state = ActuatorState::Off;
        }
    }

    /// Actuator id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Physical kind
    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    /// Current latch state
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Full activation log, oldest first
    pub fn log(&self) -> &[ActivationRecord] {
        &self.activation_log
    }

    /// Serializable summary
    pub fn status(&self) -> ActuatorStatus {
        ActuatorStatus {
            actuator_id: self.id,
            kind: self.kind,
            state: self.state,
            activation_count: self.activation_count,
            log_length: self.activation_log.len(),
        }
    }
}

/// Summary of one actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorStatus {
    /// Actuator id
    pub actuator_id: NodeId,
    /// Physical kind
    #[serde(rename = "type")]
    pub kind: ActuatorKind,
    /// Current latch state
    pub state: ActuatorState,
    /// Activations since creation
    pub activation_count: u64,
    /// Entries in the activation log
    pub log_length: usize,
}

/// All actuators of an edge device
pub struct ActuatorRegistry {
    actuators: BTreeMap<NodeId, Actuator>,
    clock: Arc<dyn TimeSource>,
}

impl ActuatorRegistry {
    /// Empty registry stamped by the system clock
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTime))
    }

    /// Empty registry stamped by a custom clock
    pub fn with_time_source(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            actuators: BTreeMap::new(),
            clock,
        }
    }

    /// Pre-create actuators `1..=count`
    pub fn with_actuators(mut self, count: NodeId) -> Self {
        for id in 1..=count {
            self.actuators.entry(id).or_insert_with(|| Actuator::new(id));
        }
        self
    }

    /// Replace the clock
    pub fn set_time_source(&mut self, clock: Arc<dyn TimeSource>) {
        self.clock = clock;
    }

    /// Turn an actuator on and log why
    pub fn activate(&mut self, actuator_id: NodeId, reason: &str, severity: Severity) -> &ActivationRecord {
        let timestamp = self.clock.now();
        let actuator = self
            .actuators
            .entry(actuator_id)
            .or_insert_with(|| Actuator::new(actuator_id));

        log_debug!(
            "actuator {} ({}) activated: {} [{}]",
            actuator_id,
            actuator.kind.as_str(),
            reason,
            severity
        );
        actuator.activate(timestamp, reason, severity)
    }

    /// Turn an actuator off; no-op if it is not on or unknown
    pub fn deactivate(&mut self, actuator_id: NodeId) {
        if let Some(actuator) = self.actuators.get_mut(&actuator_id) {
            actuator.deactivate();
        }
    }

    /// Summary of one actuator
    pub fn status(&self, actuator_id: NodeId) -> Option<ActuatorStatus> {
        self.actuators.get(&actuator_id).map(Actuator::status)
    }

    /// Borrow one actuator
    pub fn get(&self, actuator_id: NodeId) -> Option<&Actuator> {
        self.actuators.get(&actuator_id)
    }

    /// Summaries of all actuators, by id
    pub fn statuses(&self) -> Vec<ActuatorStatus> {
        self.actuators.values().map(Actuator::status).collect()
    }

    /// Number of actuators currently on
    pub fn active_count(&self) -> usize {
        self.actuators
            .values()
            .filter(|a| a.state == ActuatorState::On)
            .count()
    }

    /// Total activations across all actuators
    pub fn total_activations(&self) -> u64 {
        self.actuators.values().map(|a| a.activation_count).sum()
    }

    /// Number of known actuators
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// Whether no actuator has been created yet
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ActuatorRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorRegistry")
            .field("actuators", &self.actuators)
            .finish_non_exhaustive()
    }
}

/// Commands arriving from elsewhere become activations
impl ActuatorSink for ActuatorRegistry {
    fn command(&mut self, actuator_id: NodeId, action: ActuatorAction) -> EdgeResult<()> {
        let severity = match action {
            ActuatorAction::EmergencyShutdown => Severity::Critical,
            ActuatorAction::ActivateCooling | ActuatorAction::Alert => Severity::Warning,
            ActuatorAction::Monitor => Severity::Info,
        };
        self.activate(actuator_id, action.as_str(), severity);
        Ok(())
    }
}
