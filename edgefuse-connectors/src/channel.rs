//! Tokio channel connector
//!
//! Hands messages to another task through a bounded `mpsc` channel. A full
//! channel applies backpressure: `send` waits until the consumer catches up.

use tokio::sync::mpsc;

use crate::{ConnectionStats, Connector, ConnectorError, Message};

/// Sends messages into a tokio channel
#[derive(Debug)]
pub struct ChannelConnector {
    tx: mpsc::Sender<Message>,
    stats: ConnectionStats,
}

impl ChannelConnector {
    /// Connector and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::from_sender(tx), rx)
    }

    /// Connector over an existing sender, e.g. one shared by several nodes
    pub fn from_sender(tx: mpsc::Sender<Message>) -> Self {
        Self {
            tx,
            stats: ConnectionStats::default(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for ChannelConnector {
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        match self.tx.send(Message::new(topic, data)).await {
            Ok(()) => {
                self.stats.record_sent(data.len());
                Ok(())
            }
            Err(_) => {
                let err = ConnectorError::ChannelClosed;
                self.stats.record_failure(&err);
                Err(err)
            }
        }
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn stats(&self) -> ConnectionStats {
        self.stats.clone()
    }
}
