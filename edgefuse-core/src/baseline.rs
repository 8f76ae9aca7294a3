//! Cloud-only baseline and architecture comparison
//!
//! ## Overview
//!
//! To judge what the edge pipeline buys, the same readings can be run
//! through a cloud-centred setup where every reading is shipped upstream
//! and the cloud does a reduced check:
//!
//! | Architecture | Forwards             | Checks                               |
//! |--------------|----------------------|--------------------------------------|
//! | Edge         | anomalies + heartbeat| thresholds, health, rapid change, classifier |
//! | Cloud-only   | every reading        | thresholds, health                   |
//!
//! [`ArchitectureReport`] puts the two side by side and prices the traffic
//! under a [`ProtocolProfile`]:
//!
//! ```text
//! bytes = messages × (payload + protocol header)
//!         MQTT header ≈ 50 B, HTTP header ≈ 500 B, payload ≈ 250 B
//! ```

use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorRegistry;
use crate::aggregator::CloudEvent;
use crate::anomaly::Anomaly;
use crate::constants::forwarding::{HTTP_HEADER_BYTES, MQTT_HEADER_BYTES, TYPICAL_PAYLOAD_BYTES};
use crate::detector::{RuleAnomalyDetector, RuleSet};
use crate::errors::EdgeResult;
use crate::pipeline::EdgeMetrics;
use crate::reading::Reading;

/// Device id stamped on events produced by the baseline
pub const CLOUD_DEVICE_ID: &str = "cloud";

/// Transport whose per-message overhead prices the traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolProfile {
    /// Publish/subscribe over a persistent connection
    #[default]
    Mqtt,
    /// Request/response with full headers
    Http,
}

impl ProtocolProfile {
    /// Per-message protocol overhead in bytes
    pub const fn header_bytes(&self) -> usize {
        match self {
            ProtocolProfile::Mqtt => MQTT_HEADER_BYTES,
            ProtocolProfile::Http => HTTP_HEADER_BYTES,
        }
    }

    /// Bytes on the wire for `messages` messages of `payload_bytes` each
    pub const fn wire_bytes(&self, messages: u64, payload_bytes: usize) -> u64 {
        messages * (payload_bytes + self.header_bytes()) as u64
    }
}

/// Totals of one architecture over a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArchitectureSummary {
    /// Readings taken in
    pub readings: u64,
    /// Messages sent upstream
    pub messages_forwarded: u64,
    /// Anomalies detected
    pub anomalies: u64,
    /// Actuator activations
    pub activations: u64,
}

impl From<&EdgeMetrics> for ArchitectureSummary {
    fn from(metrics: &EdgeMetrics) -> Self {
        Self {
            readings: metrics.processed,
            messages_forwarded: metrics.forwarded,
            anomalies: metrics.anomalies(),
            activations: metrics.activations,
        }
    }
}

/// Cloud-centred reference: forward everything, check in the cloud
#[derive(Debug)]
pub struct CloudOnlyBaseline {
    detector: RuleAnomalyDetector,
    actuators: ActuatorRegistry,
    summary: ArchitectureSummary,
}

impl CloudOnlyBaseline {
    /// Baseline using the thresholds and health levels of `rules`
    pub fn new(rules: RuleSet) -> Self {
        Self {
            detector: RuleAnomalyDetector::new(rules),
            actuators: ActuatorRegistry::new(),
            summary: ArchitectureSummary::default(),
        }
    }

    /// Ship one reading to the cloud and check it there
    ///
    /// Returns the event the cloud stores for it. Invalid readings are
    /// rejected before anything is counted.
    pub fn process(&mut self, reading: &Reading) -> EdgeResult<CloudEvent> {
        reading.validate()?;

        self.summary.readings += 1;
        self.summary.messages_forwarded += 1;

        let mut anomalies: Vec<Anomaly> = self.detector.check_thresholds(reading);
        anomalies.extend(self.detector.check_health(reading));
        self.summary.anomalies += anomalies.len() as u64;

        if let Some(primary) = anomalies.first() {
            let reason = primary.channel.as_deref().unwrap_or("unknown");
            self.actuators.activate(reading.node_id, reason, primary.severity);
            self.summary.activations += 1;
        }

        Ok(CloudEvent::new(CLOUD_DEVICE_ID, reading, anomalies))
    }

    /// Totals so far
    pub fn summary(&self) -> ArchitectureSummary {
        self.summary
    }

    /// Actuators driven from the cloud
    pub fn actuators(&self) -> &ActuatorRegistry {
        &self.actuators
    }
}

impl Default for CloudOnlyBaseline {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

/// Side-by-side comparison of edge and cloud-only runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureReport {
    /// Edge pipeline totals
    pub edge: ArchitectureSummary,
    /// Cloud-only totals
    pub cloud: ArchitectureSummary,
    /// Transport used by the edge device
    pub edge_profile: ProtocolProfile,
    /// Transport used by the cloud-only nodes
    pub cloud_profile: ProtocolProfile,
    /// Payload size per message in bytes
    pub payload_bytes: usize,
}

impl ArchitectureReport {
    /// Compare two runs, both priced as MQTT
    pub fn new(edge: ArchitectureSummary, cloud: ArchitectureSummary) -> Self {
        Self {
            edge,
            cloud,
            edge_profile: ProtocolProfile::Mqtt,
            cloud_profile: ProtocolProfile::Mqtt,
            payload_bytes: TYPICAL_PAYLOAD_BYTES,
        }
    }

    /// Compare an edge pipeline's metrics against a baseline
    pub fn compare(edge: &EdgeMetrics, cloud: &CloudOnlyBaseline) -> Self {
        Self::new(ArchitectureSummary::from(edge), cloud.summary())
    }

    /// Price each side under its own transport
    pub fn with_profiles(mut self, edge: ProtocolProfile, cloud: ProtocolProfile) -> Self {
        self.edge_profile = edge;
        self.cloud_profile = cloud;
        self
    }

    /// Override the payload size
    pub fn with_payload_bytes(mut self, payload_bytes: usize) -> Self {
        self.payload_bytes = payload_bytes;
        self
    }

    /// Bytes sent upstream by the edge device
    pub fn edge_bytes(&self) -> u64 {
        self.edge_profile
            .wire_bytes(self.edge.messages_forwarded, self.payload_bytes)
    }

    /// Bytes sent upstream by the cloud-only nodes
    pub fn cloud_bytes(&self) -> u64 {
        self.cloud_profile
            .wire_bytes(self.cloud.messages_forwarded, self.payload_bytes)
    }

    /// Share of edge readings not forwarded, in percent
    pub fn edge_data_reduction_pct(&self) -> f64 {
        reduction_pct(self.edge.messages_forwarded, self.edge.readings)
    }

    /// Messages the edge device did not have to send
    pub fn messages_saved(&self) -> u64 {
        self.cloud
            .messages_forwarded
            .saturating_sub(self.edge.messages_forwarded)
    }

    /// Bandwidth saved against the cloud-only side, in percent
    pub fn bandwidth_saving_pct(&self) -> f64 {
        reduction_pct(self.edge_bytes(), self.cloud_bytes())
    }
}

fn reduction_pct(kept: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1.0 - kept as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::Severity;

    fn reading(cycle: u64, t1: f64, health: f64) -> Reading {
        Reading::builder(2, cycle)
            .measurement("temperature_1", t1)
            .measurement("rpm", 2400.0)
            .health(health)
            .build()
    }

    #[test]
    fn baseline_forwards_everything() {
        let mut baseline = CloudOnlyBaseline::default();
        for cycle in 1..=5 {
            baseline.process(&reading(cycle, 540.0, 90.0)).unwrap();
        }
        let event = baseline.process(&reading(6, 560.0, 15.0)).unwrap();

        assert_eq!(event.device_id, CLOUD_DEVICE_ID);
        assert_eq!(event.anomaly_count, 2);
        assert_eq!(event.anomalies[1].severity, Severity::Critical);

        let summary = baseline.summary();
        assert_eq!(summary.readings, 6);
        assert_eq!(summary.messages_forwarded, 6);
        assert_eq!(summary.anomalies, 2);
        assert_eq!(summary.activations, 1);

        let record = &baseline.actuators().get(2).unwrap().log()[0];
        assert_eq!(record.reason, "temperature_1");
    }

    #[test]
    fn baseline_has_no_rapid_change() {
        let mut baseline = CloudOnlyBaseline::default();
        for cycle in 1..=5 {
            baseline.process(&reading(cycle, 100.0, 90.0)).unwrap();
        }
        let event = baseline.process(&reading(6, 500.0, 90.0)).unwrap();
        assert!(!event.has_anomaly);
    }

    #[test]
    fn baseline_rejects_invalid_readings() {
        let mut baseline = CloudOnlyBaseline::default();
        assert!(baseline.process(&reading(1, f64::NAN, 90.0)).is_err());
        assert_eq!(baseline.summary().readings, 0);
    }

    #[test]
    fn protocol_pricing() {
        assert_eq!(ProtocolProfile::Mqtt.wire_bytes(10, 250), 3_000);
        assert_eq!(ProtocolProfile::Http.wire_bytes(10, 250), 7_500);
    }

    #[test]
    fn report_figures() {
        let edge = ArchitectureSummary {
            readings: 100,
            messages_forwarded: 20,
            anomalies: 12,
            activations: 10,
        };
        let cloud = ArchitectureSummary {
            readings: 100,
            messages_forwarded: 100,
            anomalies: 9,
            activations: 8,
        };

        let report = ArchitectureReport::new(edge, cloud);
        assert!((report.edge_data_reduction_pct() - 80.0).abs() < 1e-9);
        assert_eq!(report.messages_saved(), 80);
        assert_eq!(report.edge_bytes(), 6_000);
        assert_eq!(report.cloud_bytes(), 30_000);
        assert!((report.bandwidth_saving_pct() - 80.0).abs() < 1e-9);

        let http = report.with_profiles(ProtocolProfile::Mqtt, ProtocolProfile::Http);
        assert_eq!(http.cloud_bytes(), 75_000);
        assert!((http.bandwidth_saving_pct() - 92.0).abs() < 1e-9);
    }
}
