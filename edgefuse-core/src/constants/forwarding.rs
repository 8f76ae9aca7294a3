//! Forwarding and Fusion Parameters
//!
//! Controls how often an edge node talks to the cloud and how classifier
//! output is turned into severities.

// ===== FORWARDING =====

/// Cycles between forced forwards when nothing is anomalous.
///
/// Keeps a quiet node visible downstream so it is not mistaken for a dead one.
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 10;

/// Identifier an edge device reports when none is configured.
pub const DEFAULT_DEVICE_ID: &str = "edge_device_01";

/// Topic forwarded events are published on.
pub const TOPIC_CLOUD_ALERTS: &str = "iot/cloud/alerts";

/// Topic prefix for raw sensor data (`iot/sensors/{node}/data`).
pub const TOPIC_SENSOR_PREFIX: &str = "iot/sensors";

/// Topic prefix for actuator commands (`iot/actuators/{node}/command`).
pub const TOPIC_ACTUATOR_PREFIX: &str = "iot/actuators";

// ===== FUSION =====

/// Classifier confidence above which a classifier flag is critical.
pub const CLASSIFIER_CRITICAL_CONFIDENCE: f64 = 0.8;

// ===== AGGREGATOR =====

/// Events the aggregator keeps for `recent` queries.
pub const DEFAULT_RECENT_EVENT_CAPACITY: usize = 1000;

/// Processing-time samples kept for edge latency statistics.
pub const PROCESSING_TIME_SAMPLES: usize = 1000;

// ===== PROTOCOL OVERHEAD =====

/// Representative serialized payload of one reading or event (bytes).
pub const TYPICAL_PAYLOAD_BYTES: usize = 250;

/// Per-message MQTT overhead including topic (bytes).
pub const MQTT_HEADER_BYTES: usize = 50;

/// Per-request HTTP overhead including headers (bytes).
pub const HTTP_HEADER_BYTES: usize = 500;
