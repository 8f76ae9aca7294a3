//! Edge device configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! {
//!   "device_id": "press_line_3",
//!   "window_size": 20,
//!   "rules": { "thresholds": { "temperature_1": 560.0 } },
//!   "fusion": { "heartbeat_interval": 30, "batching": "deduplicated" }
//! }
//! ```
//!
//! Note that a `thresholds` table replaces the default table as a whole.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::detection::DEFAULT_WINDOW_SIZE;
use crate::constants::forwarding::{DEFAULT_DEVICE_ID, DEFAULT_RECENT_EVENT_CAPACITY};
use crate::detector::RuleSet;
use crate::errors::{EdgeError, EdgeResult};
use crate::fusion::{CommandBatching, FusionPolicy};

/// Configuration of one edge device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Identifier carried in forwarded events
    pub device_id: String,
    /// Values retained per (node, channel)
    pub window_size: usize,
    /// Detection rules
    pub rules: RuleSet,
    /// Forwarding and command policy
    pub fusion: FusionPolicy,
    /// Events kept by an aggregator built from this config
    pub aggregator_capacity: usize,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            rules: RuleSet::default(),
            fusion: FusionPolicy::default(),
            aggregator_capacity: DEFAULT_RECENT_EVENT_CAPACITY,
        }
    }
}

impl EdgeConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> EdgeResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EdgeError::invalid_config(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> EdgeResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EdgeError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize as pretty JSON
    pub fn to_json_string(&self) -> EdgeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EdgeError::invalid_config(format!("unserializable config: {}", e)))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> EdgeResult<()> {
        if self.device_id.is_empty() {
            return Err(EdgeError::invalid_config("device_id must not be empty"));
        }
        if self.window_size == 0 {
            return Err(EdgeError::invalid_config("window_size must be at least 1"));
        }
        if self.rules.rapid_change_samples == 0 || self.rules.rapid_change_samples > self.window_size {
            return Err(EdgeError::invalid_config(format!(
                "rapid_change_samples must be in 1..={} (window_size)",
                self.window_size
            )));
        }
        if self.rules.health_critical > self.rules.health_threshold {
            return Err(EdgeError::invalid_config(
                "health_critical must not exceed health_threshold",
            ));
        }
        if self.rules.thresholds.values().any(|t| !t.is_finite()) {
            return Err(EdgeError::invalid_config("thresholds must be finite"));
        }
        if self.fusion.heartbeat_interval == 0 {
            return Err(EdgeError::invalid_config("heartbeat_interval must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.fusion.critical_confidence) {
            return Err(EdgeError::invalid_config("critical_confidence must be in [0, 1]"));
        }
        if self.aggregator_capacity == 0 {
            return Err(EdgeError::invalid_config("aggregator_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Set the device id
    pub fn with_device_id(mut self, device_id: &str) -> Self {
        self.device_id = device_id.to_string();
        self
    }

    /// Set the window size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Replace the rule set
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_interval(mut self, cycles: u64) -> Self {
        self.fusion.heartbeat_interval = cycles;
        self
    }

    /// Set the classifier confidence cut-off for critical flags
    pub fn with_critical_confidence(mut self, confidence: f64) -> Self {
        self.fusion.critical_confidence = confidence;
        self
    }

    /// Set the command batching mode
    pub fn with_batching(mut self, batching: CommandBatching) -> Self {
        self.fusion.batching = batching;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EdgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_size, 10);
        assert_eq!(config.fusion.heartbeat_interval, 10);
        assert_eq!(config.device_id, "edge_device_01");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EdgeConfig::from_json_str(
            r#"{"device_id": "line_3", "fusion": {"batching": "deduplicated"}}"#,
        )
        .unwrap();

        assert_eq!(config.device_id, "line_3");
        assert_eq!(config.fusion.batching, CommandBatching::Deduplicated);
        assert_eq!(config.fusion.heartbeat_interval, 10);
        assert_eq!(config.rules, RuleSet::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EdgeConfig::default().with_window_size(0).validate().is_err());
        assert!(EdgeConfig::default().with_window_size(4).validate().is_err());
        assert!(EdgeConfig::default().with_heartbeat_interval(0).validate().is_err());
        assert!(EdgeConfig::default().with_critical_confidence(1.5).validate().is_err());
        assert!(EdgeConfig::default().with_device_id("").validate().is_err());
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = EdgeConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, EdgeError::InvalidConfig { .. }));
    }

    #[test]
    fn missing_file_is_invalid_config() {
        let err = EdgeConfig::from_path("/nonexistent/edgefuse.json").unwrap_err();
        assert!(matches!(err, EdgeError::InvalidConfig { ref reason } if reason.contains("cannot read")));
    }
}
