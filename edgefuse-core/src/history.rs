//! Per-node, per-channel rolling windows
//!
//! ## Overview
//!
//! [`WindowedHistory`] keeps the last `W` values of every channel of every
//! node a pipeline has seen. Windows are created lazily the first time a
//! (node, channel) pair shows up and never grow past `W`.
//!
//! ```text
//! WindowedHistory (W = 4)
//! ├── node 1
//! │   ├── temperature_1: [541.2, 542.0, 541.7, 543.1]
//! │   ├── rpm:           [2401, 2398, 2403]
//! │   └── health:        [92.0, 91.8, 91.5]
//! └── node 2
//!     └── ...
//! ```
//!
//! ## Concurrency
//!
//! There is no internal locking. One pipeline owns one node's history, and
//! nodes never share windows, so each pipeline can live on its own thread.

use std::collections::HashMap;

use crate::buffer::RingBuffer;
use crate::constants::DEFAULT_WINDOW_SIZE;
use crate::errors::{EdgeError, EdgeResult};
use crate::reading::NodeId;

type ChannelWindows = HashMap<String, RingBuffer<f64>>;

/// Bounded rolling history keyed by node and channel
#[derive(Debug, Clone)]
pub struct WindowedHistory {
    capacity: usize,
    nodes: HashMap<NodeId, ChannelWindows>,
}

impl WindowedHistory {
    /// Create a history retaining `capacity` values per channel
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            nodes: HashMap::new(),
        }
    }

    /// Values retained per channel
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a value, evicting the oldest one when the window is full
    pub fn append(&mut self, node_id: NodeId, channel: &str, value: f64) {
        let capacity = self.capacity;
        let channels = self.nodes.entry(node_id).or_default();

        match channels.get_mut(channel) {
            Some(window) => window.push(value),
            None => {
                let mut window = RingBuffer::with_capacity(capacity);
                window.push(value);
                channels.insert(channel.to_string(), window);
            }
        }
    }

    /// Up to `n` most recent values, oldest first
    pub fn recent(&self, node_id: NodeId, channel: &str, n: usize) -> Vec<f64> {
        self.window(node_id, channel)
            .map(|window| window.iter_recent(n).copied().collect())
            .unwrap_or_default()
    }

    /// Mean of the `n` most recent values
    ///
    /// Fails with `InsufficientData` when fewer than `n` values are stored.
    pub fn mean_of_recent(&self, node_id: NodeId, channel: &str, n: usize) -> EdgeResult<f64> {
        let available = self.len(node_id, channel);
        if n == 0 || available < n {
            return Err(EdgeError::InsufficientData { required: n, available });
        }

        let sum: f64 = self
            .window(node_id, channel)
            .map(|window| window.iter_recent(n).sum())
            .unwrap_or_default();

        Ok(sum / n as f64)
    }

    /// Number of values stored for a channel
    pub fn len(&self, node_id: NodeId, channel: &str) -> usize {
        self.window(node_id, channel).map_or(0, RingBuffer::len)
    }

    /// Whether a channel has no stored values
    pub fn is_empty(&self, node_id: NodeId, channel: &str) -> bool {
        self.len(node_id, channel) == 0
    }

    /// Nodes with at least one window
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Channels known for a node, sorted by name
    pub fn channels(&self, node_id: NodeId) -> Vec<&str> {
        let mut channels: Vec<&str> = self
            .nodes
            .get(&node_id)
            .map(|windows| windows.keys().map(String::as_str).collect())
            .unwrap_or_default();
        channels.sort_unstable();
        channels
    }

    /// Forget everything recorded for a node
    pub fn remove_node(&mut self, node_id: NodeId) {
        self.nodes.remove(&node_id);
    }

    fn window(&self, node_id: NodeId, channel: &str) -> Option<&RingBuffer<f64>> {
        self.nodes.get(&node_id)?.get(channel)
    }
}

impl Default for WindowedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
