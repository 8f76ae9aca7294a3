//! Constants for EdgeFuse Core
//!
//! Centralized defaults for the edge decision pipeline. Every tunable here is
//! also exposed through [`EdgeConfig`](crate::config::EdgeConfig); these values
//! are what a node runs with when nothing is configured.
//!
//! ## Organization
//!
//! - **Detection**: Window size, rule thresholds, rapid-change parameters
//! - **Forwarding**: Heartbeat cadence, classifier severity cut-off, topics,
//!   protocol overheads, aggregator retention
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in names where a unit applies
//! 3. Channel names are part of the external contract with sensor nodes

/// Window sizes, rule thresholds and channel names.
pub mod detection;

/// Heartbeat cadence, classifier policy, topics and protocol overheads.
pub mod forwarding;

// Re-export commonly used constants for convenience
pub use detection::{
    DEFAULT_WINDOW_SIZE, RAPID_CHANGE_SAMPLES, RAPID_CHANGE_PCT,
    HEALTH_THRESHOLD_PCT, HEALTH_CRITICAL_PCT, CHANNEL_HEALTH,
    CHANNEL_TEMPERATURE_1, CHANNEL_TEMPERATURE_2, CHANNEL_PRESSURE,
    CHANNEL_VIBRATION, CHANNEL_RPM, FEATURE_CHANNELS,
};

pub use forwarding::{
    DEFAULT_HEARTBEAT_INTERVAL, CLASSIFIER_CRITICAL_CONFIDENCE,
    DEFAULT_DEVICE_ID, TOPIC_CLOUD_ALERTS, DEFAULT_RECENT_EVENT_CAPACITY,
    TOPIC_SENSOR_PREFIX, TOPIC_ACTUATOR_PREFIX,
};
