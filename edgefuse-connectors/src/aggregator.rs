//! Loopback into an in-process aggregator
//!
//! Stands in for broker plus cloud service when nodes and aggregator share
//! one process. Topics are routed the way the cloud platform subscribes:
//!
//! | Topic                      | Aggregator entry point                    |
//! |----------------------------|-------------------------------------------|
//! | `iot/cloud/alerts`         | [`CloudAggregator::receive_payload`]      |
//! | `iot/sensors/{node}/data`  | [`CloudAggregator::receive_telemetry_payload`] |
//!
//! Actuator commands have no cloud-side consumer and are acknowledged and
//! dropped, as a broker would with no subscriber.

use std::sync::Arc;

use edgefuse_core::{
    constants::{TOPIC_CLOUD_ALERTS, TOPIC_SENSOR_PREFIX},
    CloudAggregator, EdgeResult,
};

use crate::{ConnectionStats, Connector, ConnectorError};

/// Delivers events and raw telemetry straight into a `CloudAggregator`
#[derive(Debug, Clone)]
pub struct AggregatorConnector {
    aggregator: Arc<CloudAggregator>,
    stats: ConnectionStats,
}

impl AggregatorConnector {
    /// Connector feeding `aggregator`
    pub fn new(aggregator: Arc<CloudAggregator>) -> Self {
        Self {
            aggregator,
            stats: ConnectionStats::default(),
        }
    }

    /// The shared aggregator
    pub fn aggregator(&self) -> &Arc<CloudAggregator> {
        &self.aggregator
    }

    fn route(&self, topic: &str, data: &[u8]) -> EdgeResult<()> {
        if topic == TOPIC_CLOUD_ALERTS {
            self.aggregator.receive_payload(data)
        } else if is_sensor_topic(topic) {
            self.aggregator.receive_telemetry_payload(data)
        } else {
            log_debug!("no cloud consumer for {}, dropping {} bytes", topic, data.len());
            Ok(())
        }
    }
}

fn is_sensor_topic(topic: &str) -> bool {
    topic
        .strip_prefix(TOPIC_SENSOR_PREFIX)
        .map_or(false, |rest| rest.starts_with('/'))
}

#[async_trait::async_trait]
impl Connector for AggregatorConnector {
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        if let Err(e) = self.route(topic, data) {
            let err = ConnectorError::from(e);
            self.stats.record_failure(&err);
            return Err(err);
        }

        self.stats.record_sent(data.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn stats(&self) -> ConnectionStats {
        self.stats.clone()
    }
}
