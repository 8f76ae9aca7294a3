//! MQTT connector for EdgeFuse
//!
//! Publishes through a broker with rumqttc. The rumqttc event loop runs on
//! its own tokio task; it owns reconnection and keeps the connected flag and
//! reconnection count current.
//!
//! Payloads arriving on subscribed topics are handed to the receiver
//! returned by [`MqttConnector::connect`], ready for [`EdgeNode::run`].
//! Subscriptions are replayed after every reconnect. When the receiver
//! falls behind by more than `capacity` payloads, new ones are dropped
//! with a warning so the event loop keeps servicing the broker.
//!
//! ```rust,no_run
//! use edgefuse_connectors::{Connector, EdgeNode, MqttConfig, MqttConnector};
//! use edgefuse_core::EdgePipeline;
//!
//! # async fn example() -> Result<(), edgefuse_connectors::ConnectorError> {
//! let config = MqttConfig::new("broker.hivemq.com", 1883).client_id("edge_device_01");
//! let (mqtt, readings) = MqttConnector::connect(config)?;
//! mqtt.subscribe("iot/sensors/+/data").await?;
//!
//! let mut node = EdgeNode::new(EdgePipeline::default(), mqtt);
//! node.run(readings).await;
//! # Ok(())
//! # }
//! ```
//!
//! [`EdgeNode::run`]: crate::EdgeNode::run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

pub use rumqttc::QoS;

use crate::{ConnectionStats, Connector, ConnectorError};

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host name
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier
    pub client_id: String,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Delivery guarantee for published messages
    pub qos: QoS,
    /// Requests buffered between client and event loop, and inbound
    /// payloads buffered for the receiver
    pub capacity: usize,
    /// Pause before polling again after a connection error
    pub retry_delay: Duration,
}

impl MqttConfig {
    /// Settings for `host:port` with defaults for the rest
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: edgefuse_core::constants::DEFAULT_DEVICE_ID.to_string(),
            keep_alive: Duration::from_secs(60),
            qos: QoS::AtMostOnce,
            capacity: 64,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Set the client identifier
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the keep-alive interval in seconds
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    /// Set the publish QoS
    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::ConfigError("broker host is empty".into()));
        }
        if self.client_id.is_empty() {
            return Err(ConnectorError::ConfigError("client id is empty".into()));
        }
        // rumqttc rejects keep-alives under five seconds
        if self.keep_alive < Duration::from_secs(5) {
            return Err(ConnectorError::ConfigError("keep-alive must be at least 5 s".into()));
        }
        Ok(())
    }
}

/// MQTT publisher backed by rumqttc
pub struct MqttConnector {
    client: AsyncClient,
    qos: QoS,
    connected: Arc<AtomicBool>,
    stats: Arc<Mutex<ConnectionStats>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    event_loop: JoinHandle<()>,
}

/// State shared between the connector and its event-loop task
struct Link {
    client: AsyncClient,
    qos: QoS,
    connected: Arc<AtomicBool>,
    stats: Arc<Mutex<ConnectionStats>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    inbound: mpsc::Sender<Vec<u8>>,
    retry_delay: Duration,
}

impl MqttConnector {
    /// Start the event loop and return a connector plus the receiver of
    /// payloads published on its subscriptions
    ///
    /// Must be called inside a tokio runtime. The broker connection is made
    /// asynchronously, so `is_connected` is false until the CONNACK arrives;
    /// sends made before that are queued by rumqttc.
    pub fn connect(config: MqttConfig) -> Result<(Self, mpsc::Receiver<Vec<u8>>), ConnectorError> {
        config.validate()?;

        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(config.keep_alive);

        let capacity = config.capacity.max(1);
        let (client, event_loop) = AsyncClient::new(options, capacity);
        let (inbound, readings) = mpsc::channel(capacity);

        let link = Link {
            client: client.clone(),
            qos: config.qos,
            connected: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            inbound,
            retry_delay: config.retry_delay,
        };

        let connector = Self {
            client,
            qos: config.qos,
            connected: Arc::clone(&link.connected),
            stats: Arc::clone(&link.stats),
            subscriptions: Arc::clone(&link.subscriptions),
            event_loop: tokio::spawn(drive(event_loop, link)),
        };
        Ok((connector, readings))
    }

    /// Subscribe to a topic filter, e.g. `iot/sensors/+/data`
    ///
    /// Matching payloads arrive on the receiver returned by `connect`.
    pub async fn subscribe(&self, filter: &str) -> Result<(), ConnectorError> {
        self.client
            .subscribe(filter, self.qos)
            .await
            .map_err(|e| ConnectorError::ProtocolError(e.to_string()))?;

        let mut subscriptions = lock(&self.subscriptions);
        if !subscriptions.iter().any(|s| s == filter) {
            subscriptions.push(filter.to_string());
        }
        Ok(())
    }

    /// Topic filters replayed on reconnect
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).clone()
    }

    /// Send DISCONNECT and stop the event loop
    pub async fn disconnect(self) -> Result<(), ConnectorError> {
        let result = self
            .client
            .disconnect()
            .await
            .map_err(|e| ConnectorError::ProtocolError(e.to_string()));
        self.event_loop.abort();
        result
    }
}

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn drive(mut event_loop: EventLoop, link: Link) {
    let mut ever_connected = false;
    loop {
        let failed = match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if ever_connected {
                    lock(&link.stats).reconnections += 1;
                    log_info!("reconnected to MQTT broker");
                    resubscribe(&link);
                }
                ever_connected = true;
                link.connected.store(true, Ordering::Release);
                false
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                deliver(&link.inbound, &publish);
                false
            }
            Ok(_) => false,
            Err(e) => {
                if link.connected.swap(false, Ordering::AcqRel) {
                    log_warn!("MQTT connection lost: {}", e);
                }
                lock(&link.stats).last_error = Some(e.to_string());
                true
            }
        };

        if failed {
            tokio::time::sleep(link.retry_delay).await;
        }
    }
}

/// Clean sessions drop subscriptions on disconnect
fn resubscribe(link: &Link) {
    for filter in lock(&link.subscriptions).iter() {
        if let Err(e) = link.client.try_subscribe(filter.as_str(), link.qos) {
            log_warn!("resubscribe to {} failed: {}", filter, e);
        }
    }
}

/// Hand an incoming publish to the receiver without blocking the event loop
fn deliver(inbound: &mpsc::Sender<Vec<u8>>, publish: &Publish) -> bool {
    match inbound.try_send(publish.payload.to_vec()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log_warn!("inbound queue full, dropping message on {}", publish.topic);
            false
        }
        Err(TrySendError::Closed(_)) => {
            log_debug!("no receiver for message on {}", publish.topic);
            false
        }
    }
}

#[async_trait::async_trait]
impl Connector for MqttConnector {
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        match self.client.publish(topic, self.qos, false, data.to_vec()).await {
            Ok(()) => {
                lock(&self.stats).record_sent(data.len());
                Ok(())
            }
            Err(e) => {
                let err = ConnectorError::ProtocolError(e.to_string());
                lock(&self.stats).record_failure(&err);
                Err(err)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn stats(&self) -> ConnectionStats {
        lock(&self.stats).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = MqttConfig::new("broker.local", 1883)
            .client_id("sensor_gateway")
            .keep_alive_secs(30)
            .qos(QoS::AtLeastOnce);

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.client_id, "sensor_gateway");
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert_eq!(config.qos, QoS::AtLeastOnce);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        assert!(MqttConfig::new("", 1883).validate().is_err());
        assert!(MqttConfig::new("broker", 1883).client_id("").validate().is_err());
        assert!(MqttConfig::new("broker", 1883).keep_alive_secs(1).validate().is_err());
    }

    #[tokio::test]
    async fn starts_disconnected() {
        // Nothing listens on this port; the event loop keeps retrying
        let config = MqttConfig::new("127.0.0.1", 1).client_id("offline_test");
        let (connector, _readings) = MqttConnector::connect(config).unwrap();
        assert!(!connector.is_connected());
        assert_eq!(connector.stats().messages_sent, 0);

        // Requests queue in the client until the broker answers
        connector.subscribe("iot/sensors/+/data").await.unwrap();
        connector.subscribe("iot/sensors/+/data").await.unwrap();
        assert_eq!(connector.subscriptions(), vec!["iot/sensors/+/data".to_string()]);
        connector.event_loop.abort();
    }

    #[tokio::test]
    async fn incoming_publishes_reach_the_receiver() {
        let (inbound, mut readings) = mpsc::channel(1);
        let first = Publish::new("iot/sensors/1/data", QoS::AtMostOnce, br#"{"node_id":1}"#.to_vec());
        let second = Publish::new("iot/sensors/2/data", QoS::AtMostOnce, br#"{"node_id":2}"#.to_vec());

        assert!(deliver(&inbound, &first));
        // Full queue drops instead of stalling
        assert!(!deliver(&inbound, &second));
        assert_eq!(readings.recv().await.unwrap(), br#"{"node_id":1}"#.to_vec());

        drop(readings);
        assert!(!deliver(&inbound, &second));
    }
}
