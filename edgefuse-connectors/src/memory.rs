//! In-memory connector
//!
//! Keeps every published message in order. Useful in tests and for dry runs
//! where a node should make decisions without any network.

use crate::{ConnectionStats, Connector, ConnectorError, Message};

/// Records messages instead of sending them
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    messages: Vec<Message>,
    connected: bool,
    stats: ConnectionStats,
}

impl MemoryConnector {
    /// Connected, empty connector
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            connected: true,
            stats: ConnectionStats::default(),
        }
    }

    /// Simulate a link going down or coming back
    pub fn set_connected(&mut self, connected: bool) {
        if connected && !self.connected {
            self.stats.reconnections += 1;
        }
        self.connected = connected;
    }

    /// Everything sent so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages sent on one topic
    pub fn on_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.topic == topic)
    }

    /// Drain the recorded messages
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), ConnectorError> {
        if !self.connected {
            let err = ConnectorError::NotConnected;
            self.stats.record_failure(&err);
            return Err(err);
        }

        self.messages.push(Message::new(topic, data));
        self.stats.record_sent(data.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> ConnectionStats {
        self.stats.clone()
    }
}
