//! Sensor Readings
//!
//! ## Overview
//!
//! A [`Reading`] is one tick from one sensor node: a cycle number, a set of
//! named measurements and a health indicator. Readings are produced by an
//! external source, consumed once by the node's pipeline and then dropped.
//!
//! ## Channel Ordering
//!
//! Detection results are ordered, and the first anomaly becomes the primary
//! reason for actuation. To keep that deterministic, channels are always
//! visited in the same order:
//!
//! ```text
//! temperature_1 → temperature_2 → pressure → vibration → rpm → (others, A-Z)
//! ```
//!
//! The canonical five come first in the order classifiers are trained on;
//! anything else a node reports follows in lexical order.
//!
//! ## Wire Format
//!
//! Nodes publish JSON shaped like:
//!
//! ```json
//! {
//!   "node_id": 1,
//!   "cycle": 150,
//!   "timestamp": 1700000000000,
//!   "measurements": {"temperature_1": 555.0, "rpm": 2420.0},
//!   "health": 25.0
//! }
//! ```
//!
//! [`Reading::from_json`] is the fault-isolating entry point for that format:
//! a missing `node_id` or a non-numeric measurement becomes
//! [`EdgeError::InvalidReading`] instead of a panic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::detection::{
    CHANNEL_HEALTH, FEATURE_CHANNELS, HEALTH_MAX_PCT, HEALTH_MIN_PCT,
};
use crate::constants::forwarding::TOPIC_SENSOR_PREFIX;
use crate::errors::{EdgeError, EdgeResult};
use crate::time::Timestamp;

/// Sensor node identifier
pub type NodeId = u32;

/// Health reported when a payload omits it
const DEFAULT_HEALTH_PCT: f64 = 100.0;

/// One tick from one sensor node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Source node
    pub node_id: NodeId,
    /// Monotonic sequence number per node
    pub cycle: u64,
    /// Capture time in milliseconds
    #[serde(default)]
    pub timestamp: Timestamp,
    /// Channel name → measured value
    pub measurements: BTreeMap<String, f64>,
    /// Health indicator, 0 (failed) to 100 (new)
    pub health: f64,
}

impl Reading {
    /// Start building a reading for `node_id` at `cycle`
    pub fn builder(node_id: NodeId, cycle: u64) -> ReadingBuilder {
        ReadingBuilder::new(node_id, cycle)
    }

    /// Value of a channel, if the node reported it
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.measurements.get(channel).copied()
    }

    /// Channels with their values in deterministic processing order
    pub fn channels(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        let canonical = FEATURE_CHANNELS
            .iter()
            .filter_map(move |name| self.measurements.get_key_value(*name));
        let others = self
            .measurements
            .iter()
            .filter(|(name, _)| !FEATURE_CHANNELS.contains(&name.as_str()));

        canonical
            .chain(others)
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Check the reading is safe to feed into node state
    pub fn validate(&self) -> EdgeResult<()> {
        for (channel, value) in &self.measurements {
            if channel.is_empty() {
                return Err(EdgeError::invalid_reading("empty channel name"));
            }
            // Health has its own field and history window
            if channel == CHANNEL_HEALTH {
                return Err(EdgeError::invalid_reading(
                    "'health' is reserved and cannot be a measurement",
                ));
            }
            if !value.is_finite() {
                return Err(EdgeError::invalid_reading(format!(
                    "measurement '{}' is not a finite number",
                    channel
                )));
            }
        }

        if !self.health.is_finite() || !(HEALTH_MIN_PCT..=HEALTH_MAX_PCT).contains(&self.health) {
            return Err(EdgeError::invalid_reading(format!(
                "health {} outside [{}, {}]",
                self.health, HEALTH_MIN_PCT, HEALTH_MAX_PCT
            )));
        }

        Ok(())
    }

    /// Decode and validate a reading from its JSON wire format
    pub fn from_json(payload: &[u8]) -> EdgeResult<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| EdgeError::invalid_reading(format!("malformed JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Decode and validate a reading from an already-parsed JSON value
    pub fn from_value(value: &Value) -> EdgeResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| EdgeError::invalid_reading("payload is not an object"))?;

        let node_id = object
            .get("node_id")
            .ok_or_else(|| EdgeError::invalid_reading("missing node_id"))?
            .as_u64()
            .and_then(|id| NodeId::try_from(id).ok())
            .ok_or_else(|| EdgeError::invalid_reading("node_id is not a valid node identifier"))?;

        let cycle = object
            .get("cycle")
            .ok_or_else(|| EdgeError::invalid_reading("missing cycle"))?
            .as_u64()
            .ok_or_else(|| EdgeError::invalid_reading("cycle is not a non-negative integer"))?;

        let timestamp = object.get("timestamp").and_then(Value::as_u64).unwrap_or_default();

        let mut measurements = BTreeMap::new();
        if let Some(raw) = object.get("measurements") {
            let raw = raw
                .as_object()
                .ok_or_else(|| EdgeError::invalid_reading("measurements is not an object"))?;
            for (channel, value) in raw {
                let value = value.as_f64().ok_or_else(|| {
                    EdgeError::invalid_reading(format!("measurement '{}' is not numeric", channel))
                })?;
                measurements.insert(channel.clone(), value);
            }
        }

        let health = match object.get("health") {
            Some(raw) => raw
                .as_f64()
                .ok_or_else(|| EdgeError::invalid_reading("health is not numeric"))?,
            None => DEFAULT_HEALTH_PCT,
        };

        let reading = Self {
            node_id,
            cycle,
            timestamp,
            measurements,
            health,
        };
        reading.validate()?;
        Ok(reading)
    }

    /// Serialize to the JSON wire format
    pub fn to_json(&self) -> EdgeResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| EdgeError::invalid_reading(format!("unserializable reading: {}", e)))
    }

    /// Topic a node publishes its raw readings on
    pub fn topic(&self) -> String {
        sensor_topic(self.node_id)
    }
}

/// Topic for raw readings of `node_id`
pub fn sensor_topic(node_id: NodeId) -> String {
    format!("{}/{}/data", TOPIC_SENSOR_PREFIX, node_id)
}

/// Builder for readings
///
/// ```rust
/// use edgefuse_core::Reading;
///
/// let reading = Reading::builder(1, 10)
///     .timestamp(1000)
///     .measurement("temperature_1", 520.0)
///     .health(87.5)
///     .build();
/// assert_eq!(reading.get("temperature_1"), Some(520.0));
/// ```
#[derive(Debug, Clone)]
pub struct ReadingBuilder {
    reading: Reading,
}

impl ReadingBuilder {
    /// Create a builder with no measurements and full health
    pub fn new(node_id: NodeId, cycle: u64) -> Self {
        Self {
            reading: Reading {
                node_id,
                cycle,
                timestamp: 0,
                measurements: BTreeMap::new(),
                health: DEFAULT_HEALTH_PCT,
            },
        }
    }

    /// Set the capture time
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.reading.timestamp = timestamp;
        self
    }

    /// Add or replace one channel
    pub fn measurement(mut self, channel: &str, value: f64) -> Self {
        self.reading.measurements.insert(channel.to_string(), value);
        self
    }

    /// Set the health indicator
    pub fn health(mut self, health: f64) -> Self {
        self.reading.health = health;
        self
    }

    /// Finish without validation
    pub fn build(self) -> Reading {
        self.reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Reading {
        Reading::builder(1, 150)
            .measurement("rpm", 2420.0)
            .measurement("zeta", 1.0)
            .measurement("temperature_2", 685.0)
            .measurement("alpha", 2.0)
            .measurement("temperature_1", 555.0)
            .health(25.0)
            .build()
    }

    #[test]
    fn channels_follow_canonical_order() {
        let reading = sample();
        let order: Vec<&str> = reading.channels().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["temperature_1", "temperature_2", "rpm", "alpha", "zeta"]);
    }

    #[test]
    fn parse_valid_payload() {
        let payload = br#"{
            "node_id": 3,
            "cycle": 7,
            "timestamp": 1234,
            "measurements": {"temperature_1": 540.5, "pressure": 15.2},
            "health": 88.0
        }"#;

        let reading = Reading::from_json(payload).unwrap();
        assert_eq!(reading.node_id, 3);
        assert_eq!(reading.cycle, 7);
        assert_eq!(reading.timestamp, 1234);
        assert_eq!(reading.get("pressure"), Some(15.2));
        assert_eq!(reading.health, 88.0);
    }

    #[test]
    fn missing_node_id_is_rejected() {
        let payload = br#"{"cycle": 1, "measurements": {"rpm": 2400.0}, "health": 90.0}"#;
        let err = Reading::from_json(payload).unwrap_err();
        assert_eq!(err, EdgeError::invalid_reading("missing node_id"));
    }

    #[test]
    fn non_numeric_measurement_is_rejected() {
        let payload = br#"{"node_id": 1, "cycle": 1, "measurements": {"rpm": "fast"}, "health": 90.0}"#;
        let err = Reading::from_json(payload).unwrap_err();
        assert!(matches!(err, EdgeError::InvalidReading { ref reason } if reason.contains("rpm")));
    }

    #[test]
    fn health_defaults_when_absent() {
        let payload = br#"{"node_id": 1, "cycle": 1, "measurements": {}}"#;
        let reading = Reading::from_json(payload).unwrap();
        assert_eq!(reading.health, 100.0);
    }

    #[test]
    fn out_of_range_health_is_rejected() {
        let reading = Reading::builder(1, 1).health(140.0).build();
        assert!(reading.validate().is_err());

        let reading = Reading::builder(1, 1).measurement("rpm", f64::NAN).build();
        assert!(reading.validate().is_err());
    }

    #[test]
    fn health_measurement_is_rejected() {
        let reading = Reading::builder(1, 1).measurement("health", 20.0).health(90.0).build();
        assert!(reading.validate().is_err());

        let payload = br#"{"node_id": 1, "cycle": 1, "measurements": {"health": 20.0}, "health": 90.0}"#;
        let err = Reading::from_json(payload).unwrap_err();
        assert!(matches!(err, EdgeError::InvalidReading { ref reason } if reason.contains("reserved")));
    }

    #[test]
    fn json_round_trip_keeps_values() {
        let reading = sample();
        let bytes = reading.to_json().unwrap();
        assert_eq!(Reading::from_json(&bytes).unwrap(), reading);
    }

    #[test]
    fn sensor_topic_format() {
        assert_eq!(sample().topic(), "iot/sensors/1/data");
    }
}
