//! Actuator commands emitted by fusion

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, Severity};
use crate::constants::forwarding::TOPIC_ACTUATOR_PREFIX;
use crate::errors::{EdgeError, EdgeResult};
use crate::reading::NodeId;
use crate::time::Timestamp;

/// What an actuator is told to do
///
/// Ordered by urgency: `EmergencyShutdown` dominates everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActuatorAction {
    /// Stop the machine now
    EmergencyShutdown,
    /// Run cooling
    ActivateCooling,
    /// Raise an operator alert
    Alert,
    /// Keep watching
    Monitor,
}

impl ActuatorAction {
    /// Map an anomaly to its command
    ///
    /// | Severity | Channel         | Action              |
    /// |----------|-----------------|---------------------|
    /// | Critical | any             | `EmergencyShutdown` |
    /// | Warning  | `*temperature*` | `ActivateCooling`   |
    /// | Warning  | other           | `Alert`             |
    /// | Info     | any             | `Monitor`           |
    pub fn for_anomaly(anomaly: &Anomaly) -> Self {
        match anomaly.severity {
            Severity::Critical => ActuatorAction::EmergencyShutdown,
            Severity::Warning if anomaly.is_temperature() => ActuatorAction::ActivateCooling,
            Severity::Warning => ActuatorAction::Alert,
            Severity::Info => ActuatorAction::Monitor,
        }
    }

    /// Upper-case label used on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActuatorAction::EmergencyShutdown => "EMERGENCY_SHUTDOWN",
            ActuatorAction::ActivateCooling => "ACTIVATE_COOLING",
            ActuatorAction::Alert => "ALERT",
            ActuatorAction::Monitor => "MONITOR",
        }
    }
}

impl fmt::Display for ActuatorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command for the actuator attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Target node (actuators are addressed by the node they sit on)
    pub node_id: NodeId,
    /// Requested action
    pub action: ActuatorAction,
}

impl ActuatorCommand {
    /// Create a command
    pub const fn new(node_id: NodeId, action: ActuatorAction) -> Self {
        Self { node_id, action }
    }

    /// Topic the command is published on
    pub fn topic(&self) -> String {
        actuator_topic(self.node_id)
    }

    /// Wire payload: `{"node_id", "action", "timestamp"}`
    pub fn to_payload(&self, timestamp: Timestamp) -> EdgeResult<Vec<u8>> {
        #[derive(Serialize)]
        struct Payload {
            node_id: NodeId,
            action: ActuatorAction,
            timestamp: Timestamp,
        }

        serde_json::to_vec(&Payload {
            node_id: self.node_id,
            action: self.action,
            timestamp,
        })
        .map_err(|e| EdgeError::invalid_reading(format!("unserializable command: {}", e)))
    }
}

/// Topic for commands to the actuator of `node_id`
pub fn actuator_topic(node_id: NodeId) -> String {
    format!("{}/{}/command", TOPIC_ACTUATOR_PREFIX, node_id)
}

/// How anomalies of one reading turn into commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandBatching {
    /// One command per anomaly, in anomaly order
    #[default]
    PerAnomaly,
    /// Distinct actions only, most urgent first
    Deduplicated,
}

impl CommandBatching {
    /// Build the command list for `node_id`
    pub fn commands(&self, node_id: NodeId, anomalies: &[Anomaly]) -> Vec<ActuatorCommand> {
        let actions = anomalies.iter().map(ActuatorAction::for_anomaly);

        match self {
            CommandBatching::PerAnomaly => actions
                .map(|action| ActuatorCommand::new(node_id, action))
                .collect(),
            CommandBatching::Deduplicated => {
                let mut distinct: Vec<ActuatorAction> = actions.collect();
                distinct.sort_unstable();
                distinct.dedup();
                distinct
                    .into_iter()
                    .map(|action| ActuatorCommand::new(node_id, action))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_mapping() {
        let hot = Anomaly::threshold_exceeded("temperature_1", 560.0, 550.0);
        assert_eq!(ActuatorAction::for_anomaly(&hot), ActuatorAction::ActivateCooling);

        let fast = Anomaly::threshold_exceeded("rpm", 2500.0, 2450.0);
        assert_eq!(ActuatorAction::for_anomaly(&fast), ActuatorAction::Alert);

        let failing = Anomaly::low_health(10.0, 30.0, Severity::Critical);
        assert_eq!(ActuatorAction::for_anomaly(&failing), ActuatorAction::EmergencyShutdown);

        let mut info = Anomaly::threshold_exceeded("temperature_2", 700.0, 680.0);
        info.severity = Severity::Info;
        assert_eq!(ActuatorAction::for_anomaly(&info), ActuatorAction::Monitor);
    }

    #[test]
    fn deduplicated_puts_emergency_first() {
        let anomalies = vec![
            Anomaly::threshold_exceeded("temperature_1", 560.0, 550.0),
            Anomaly::threshold_exceeded("temperature_2", 690.0, 680.0),
            Anomaly::low_health(15.0, 30.0, Severity::Critical),
        ];

        let per_anomaly = CommandBatching::PerAnomaly.commands(4, &anomalies);
        assert_eq!(per_anomaly.len(), 3);
        assert_eq!(per_anomaly[0].action, ActuatorAction::ActivateCooling);

        let deduplicated = CommandBatching::Deduplicated.commands(4, &anomalies);
        assert_eq!(
            deduplicated,
            vec![
                ActuatorCommand::new(4, ActuatorAction::EmergencyShutdown),
                ActuatorCommand::new(4, ActuatorAction::ActivateCooling),
            ]
        );
    }

    #[test]
    fn command_wire_format() {
        let command = ActuatorCommand::new(2, ActuatorAction::Alert);
        assert_eq!(command.topic(), "iot/actuators/2/command");

        let payload: serde_json::Value =
            serde_json::from_slice(&command.to_payload(99).unwrap()).unwrap();
        assert_eq!(payload["action"], "ALERT");
        assert_eq!(payload["node_id"], 2);
        assert_eq!(payload["timestamp"], 99);
    }
}
