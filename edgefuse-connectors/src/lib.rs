//! Transport Connectors for Edge-to-Cloud Communication
//!
//! ## Overview
//!
//! An edge node talks to the outside world on three topics:
//!
//! | Topic                          | Payload                     | Direction      |
//! |--------------------------------|-----------------------------|----------------|
//! | `iot/cloud/alerts`             | `CloudEvent` JSON           | edge → cloud   |
//! | `iot/actuators/{node}/command` | `{node_id, action, timestamp}` | edge → actuator |
//! | `iot/sensors/{node}/data`      | `Reading` JSON              | sensor → edge (or cloud, cloud-only) |
//!
//! Every transport implements [`Connector`], so the node logic in
//! [`node::EdgeNode`] does not care whether bytes end up on a broker, in a
//! tokio channel, or straight in an in-process aggregator.
//!
//! ## Connectors
//!
//! - [`MemoryConnector`]: records every message; tests and dry runs
//! - [`ChannelConnector`]: pushes messages into a tokio `mpsc` channel
//! - [`AggregatorConnector`]: delivers alerts into a shared `CloudAggregator`
//! - `MqttConnector` (feature `mqtt`): publishes through a broker with rumqttc
//!
//! ## Protocol Overhead
//!
//! [`ConnectionStats`] counts payload bytes only. Wire cost depends on the
//! protocol, so it is priced separately with a `ProtocolProfile`:
//!
//! ```text
//! wire bytes = payload bytes + messages × header bytes
//!              MQTT header ≈ 50 B, HTTP request ≈ 500 B
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use edgefuse_connectors::{Connector, MemoryConnector};
//!
//! # async fn example() -> Result<(), edgefuse_connectors::ConnectorError> {
//! let mut connector = MemoryConnector::new();
//! connector.send("iot/cloud/alerts", br#"{"node_id":1}"#).await?;
//! assert_eq!(connector.stats().messages_sent, 1);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod aggregator;
pub mod channel;
pub mod memory;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod node;

pub use aggregator::AggregatorConnector;
pub use channel::ChannelConnector;
pub use memory::MemoryConnector;
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector};
pub use node::{CloudOnlyForwarder, EdgeNode, NodeStats};

use edgefuse_core::{EdgeError, ProtocolProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] EdgeError),
}

/// A message as it travels over a connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Destination topic
    pub topic: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Message {
    /// Create a message
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Trait for all transport connectors
#[async_trait::async_trait]
pub trait Connector: Send {
    /// Publish `data` on `topic`
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Get connection statistics
    fn stats(&self) -> ConnectionStats;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total payload bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Count one delivered message
    pub fn record_sent(&mut self, payload_len: usize) {
        self.messages_sent += 1;
        self.bytes_sent += payload_len as u64;
    }

    /// Count one failed message
    pub fn record_failure(&mut self, error: &ConnectorError) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }

    /// Bytes on the wire including per-message protocol overhead
    pub fn wire_bytes(&self, profile: ProtocolProfile) -> u64 {
        self.bytes_sent + self.messages_sent * profile.header_bytes() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_price_protocol_overhead() {
        let mut stats = ConnectionStats::default();
        stats.record_sent(250);
        stats.record_sent(150);

        assert_eq!(stats.bytes_sent, 400);
        assert_eq!(stats.wire_bytes(ProtocolProfile::Mqtt), 400 + 2 * 50);
        assert_eq!(stats.wire_bytes(ProtocolProfile::Http), 400 + 2 * 500);
    }

    #[test]
    fn failures_keep_last_error() {
        let mut stats = ConnectionStats::default();
        stats.record_failure(&ConnectorError::NotConnected);
        stats.record_failure(&ConnectorError::ChannelClosed);

        assert_eq!(stats.messages_failed, 2);
        assert_eq!(stats.last_error.as_deref(), Some("Channel closed"));
    }

    #[test]
    fn pipeline_errors_convert() {
        let err: ConnectorError = EdgeError::invalid_reading("bad").into();
        assert_eq!(err.to_string(), "Pipeline error: Invalid reading: bad");
    }
}
