//! Cloud Aggregator
//!
//! ## Overview
//!
//! The aggregator is the cloud-side sink every edge node forwards to. It is
//! the only state shared between nodes, so it is built to be wrapped in an
//! `Arc` and called from many threads at once:
//!
//! ```text
//! node 1 pipeline ──┐
//! node 2 pipeline ──┼──► Arc<CloudAggregator> ──► Mutex<AggregatorState>
//! node N pipeline ──┘                              ├── statistics
//!                                                  ├── recent events (bounded)
//!                                                  └── per-node status
//! ```
//!
//! ## Counters
//!
//! For every received event:
//!
//! - `total_messages += 1`
//! - with anomaly: `anomaly_messages += 1`, then per carried anomaly
//!   `critical_alerts += 1` (Critical) or `warnings += 1` (Warning)
//! - otherwise: `normal_messages += 1`
//!
//! so `total_messages == anomaly_messages + normal_messages` holds after
//! every call. Carried anomalies are also tallied per [`AnomalyKind`] in
//! `by_kind`. Counters only grow; they reset only with a new aggregator.
//!
//! ## Telemetry
//!
//! Cloud-only deployments ship raw readings instead of events. Those go
//! through [`CloudAggregator::receive_telemetry`], which bumps
//! `telemetry_messages` and the node's status but none of the event
//! counters above.
//!
//! ## Poisoning
//!
//! A poisoned mutex means a thread panicked mid-update, which is a bug.
//! Debug builds assert on it; release builds log the conflict and carry on
//! with the inner state.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, AnomalyKind, Severity};
use crate::constants::detection::{CHANNEL_TEMPERATURE_1, CHANNEL_TEMPERATURE_2};
use crate::constants::forwarding::DEFAULT_RECENT_EVENT_CAPACITY;
use crate::errors::{EdgeError, EdgeResult};
use crate::reading::{NodeId, Reading};
use crate::time::{SystemTime, TimeSource, Timestamp};

/// Condensed view of the reading an event was built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Health of the source node
    pub health: f64,
    /// Mean of the temperature channels present, if any
    pub temperature_avg: Option<f64>,
    /// Whether any carried anomaly is critical
    pub critical_status: bool,
}

/// Message forwarded from an edge device to the cloud
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Forwarding edge device
    pub device_id: String,
    /// Source node
    pub node_id: NodeId,
    /// Capture time of the reading
    pub timestamp: Timestamp,
    /// Source cycle
    pub cycle: u64,
    /// Whether anomalies are attached
    pub has_anomaly: bool,
    /// Number of attached anomalies
    pub anomaly_count: usize,
    /// Attached anomalies
    pub anomalies: Vec<Anomaly>,
    /// Reading summary
    pub summary: EventSummary,
}

impl CloudEvent {
    /// Build an event for a reading and the anomalies found in it
    pub fn new(device_id: &str, reading: &Reading, anomalies: Vec<Anomaly>) -> Self {
        let temperatures: Vec<f64> = [CHANNEL_TEMPERATURE_1, CHANNEL_TEMPERATURE_2]
            .iter()
            .filter_map(|channel| reading.get(channel))
            .collect();
        let temperature_avg = (!temperatures.is_empty())
            .then(|| temperatures.iter().sum::<f64>() / temperatures.len() as f64);

        let summary = EventSummary {
            health: reading.health,
            temperature_avg,
            critical_status: anomalies.iter().any(|a| a.severity == Severity::Critical),
        };

        Self {
            device_id: device_id.to_string(),
            node_id: reading.node_id,
            timestamp: reading.timestamp,
            cycle: reading.cycle,
            has_anomaly: !anomalies.is_empty(),
            anomaly_count: anomalies.len(),
            anomalies,
            summary,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> EdgeResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| EdgeError::invalid_reading(format!("unserializable event: {}", e)))
    }

    /// Decode from JSON
    pub fn from_json(payload: &[u8]) -> EdgeResult<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| EdgeError::invalid_reading(format!("malformed event: {}", e)))
    }
}

/// Anomalies received, by the check that produced them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindCounters {
    /// Channel values above threshold
    pub threshold_exceeded: u64,
    /// Rapid changes against the moving average
    pub rapid_change: u64,
    /// Low health findings
    pub low_health: u64,
    /// Classifier flags
    pub classifier_flag: u64,
}

impl KindCounters {
    /// Count for one kind
    pub fn get(&self, kind: AnomalyKind) -> u64 {
        match kind {
            AnomalyKind::ThresholdExceeded => self.threshold_exceeded,
            AnomalyKind::RapidChange => self.rapid_change,
            AnomalyKind::LowHealth => self.low_health,
            AnomalyKind::ClassifierFlag => self.classifier_flag,
        }
    }

    /// Sum over all kinds
    pub fn total(&self) -> u64 {
        self.threshold_exceeded + self.rapid_change + self.low_health + self.classifier_flag
    }

    fn bump(&mut self, kind: AnomalyKind) {
        match kind {
            AnomalyKind::ThresholdExceeded => self.threshold_exceeded += 1,
            AnomalyKind::RapidChange => self.rapid_change += 1,
            AnomalyKind::LowHealth => self.low_health += 1,
            AnomalyKind::ClassifierFlag => self.classifier_flag += 1,
        }
    }
}

/// Monotone counters of the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatorStatistics {
    /// Every received event
    pub total_messages: u64,
    /// Events carrying at least one anomaly
    pub anomaly_messages: u64,
    /// Events carrying none
    pub normal_messages: u64,
    /// Critical anomalies across all events
    pub critical_alerts: u64,
    /// Warning anomalies across all events
    pub warnings: u64,
    /// Anomalies across all events, by kind
    pub by_kind: KindCounters,
    /// Raw readings received; not part of `total_messages`
    pub telemetry_messages: u64,
}

impl AggregatorStatistics {
    fn record(&mut self, event: &CloudEvent) {
        self.total_messages += 1;

        if event.has_anomaly {
            self.anomaly_messages += 1;
            for anomaly in &event.anomalies {
                self.by_kind.bump(anomaly.kind);
                match anomaly.severity {
                    Severity::Critical => self.critical_alerts += 1,
                    Severity::Warning => self.warnings += 1,
                    Severity::Info => {}
                }
            }
        } else {
            self.normal_messages += 1;
        }
    }
}

/// Last known state of one node, as seen by the cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Node id
    pub node_id: NodeId,
    /// Cycle of the latest event
    pub last_cycle: u64,
    /// Health reported in the latest event
    pub last_health: f64,
    /// Arrival time of the latest event
    pub last_seen: Timestamp,
    /// Events received from this node
    pub messages: u64,
    /// Raw readings received from this node
    pub telemetry: u64,
}

impl NodeStatus {
    fn first_seen(node_id: NodeId, cycle: u64, health: f64, arrived: Timestamp) -> Self {
        Self {
            node_id,
            last_cycle: cycle,
            last_health: health,
            last_seen: arrived,
            messages: 0,
            telemetry: 0,
        }
    }

    fn touch(&mut self, cycle: u64, health: f64, arrived: Timestamp) {
        self.last_cycle = cycle;
        self.last_health = health;
        self.last_seen = arrived;
    }
}

#[derive(Debug)]
struct AggregatorState {
    statistics: AggregatorStatistics,
    recent: VecDeque<CloudEvent>,
    telemetry: VecDeque<Reading>,
    nodes: BTreeMap<NodeId, NodeStatus>,
}

/// Shared, thread-safe sink for forwarded events
pub struct CloudAggregator {
    state: Mutex<AggregatorState>,
    recent_capacity: usize,
    clock: Arc<dyn TimeSource>,
}

impl CloudAggregator {
    /// Aggregator keeping the default number of recent events
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECENT_EVENT_CAPACITY)
    }

    /// Aggregator keeping at most `recent_capacity` events
    pub fn with_capacity(recent_capacity: usize) -> Self {
        Self {
            state: Mutex::new(AggregatorState {
                statistics: AggregatorStatistics::default(),
                recent: VecDeque::with_capacity(recent_capacity.min(DEFAULT_RECENT_EVENT_CAPACITY)),
                telemetry: VecDeque::new(),
                nodes: BTreeMap::new(),
            }),
            recent_capacity: recent_capacity.max(1),
            clock: Arc::new(SystemTime),
        }
    }

    /// Stamp arrivals with a custom clock
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Record one forwarded event
    pub fn receive(&self, event: CloudEvent) {
        let arrived = self.clock.now();
        let mut state = self.lock();

        state.statistics.record(&event);

        let status = state.nodes.entry(event.node_id).or_insert_with(|| {
            NodeStatus::first_seen(event.node_id, event.cycle, event.summary.health, arrived)
        });
        status.touch(event.cycle, event.summary.health, arrived);
        status.messages += 1;

        if state.recent.len() == self.recent_capacity {
            state.recent.pop_front();
        }
        state.recent.push_back(event);
    }

    /// Decode a JSON event and record it
    ///
    /// Malformed payloads are rejected and leave the counters untouched.
    pub fn receive_payload(&self, payload: &[u8]) -> EdgeResult<()> {
        let event = CloudEvent::from_json(payload)?;
        self.receive(event);
        Ok(())
    }

    /// Record one raw reading shipped by a cloud-only node
    pub fn receive_telemetry(&self, reading: Reading) {
        let arrived = self.clock.now();
        let mut state = self.lock();

        state.statistics.telemetry_messages += 1;

        let status = state.nodes.entry(reading.node_id).or_insert_with(|| {
            NodeStatus::first_seen(reading.node_id, reading.cycle, reading.health, arrived)
        });
        status.touch(reading.cycle, reading.health, arrived);
        status.telemetry += 1;

        if state.telemetry.len() == self.recent_capacity {
            state.telemetry.pop_front();
        }
        state.telemetry.push_back(reading);
    }

    /// Decode a JSON reading and record it as telemetry
    ///
    /// Undecodable or invalid readings are rejected and leave the counters
    /// untouched.
    pub fn receive_telemetry_payload(&self, payload: &[u8]) -> EdgeResult<()> {
        let reading = Reading::from_json(payload)?;
        self.receive_telemetry(reading);
        Ok(())
    }

    /// Up to `n` most recent raw readings, in arrival order
    pub fn recent_telemetry(&self, n: usize) -> Vec<Reading> {
        let state = self.lock();
        let skip = state.telemetry.len().saturating_sub(n);
        state.telemetry.iter().skip(skip).cloned().collect()
    }

    /// Up to `n` most recent events, in arrival order
    pub fn recent(&self, n: usize) -> Vec<CloudEvent> {
        let state = self.lock();
        let skip = state.recent.len().saturating_sub(n);
        state.recent.iter().skip(skip).cloned().collect()
    }

    /// Copy of the counters
    pub fn snapshot(&self) -> AggregatorStatistics {
        self.lock().statistics
    }

    /// Last known state of a node
    pub fn node_status(&self, node_id: NodeId) -> Option<NodeStatus> {
        self.lock().nodes.get(&node_id).copied()
    }

    /// Number of nodes that have reported at least once
    pub fn nodes_online(&self) -> usize {
        self.lock().nodes.len()
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                debug_assert!(false, "{}", EdgeError::AggregatorWriteConflict);
                log_error!("{}; recovering inner state", EdgeError::AggregatorWriteConflict);
                poisoned.into_inner()
            }
        }
    }
}

impl Default for CloudAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CloudAggregator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CloudAggregator")
            .field("recent_capacity", &self.recent_capacity)
            .field("statistics", &self.snapshot())
            .finish_non_exhaustive()
    }
}
