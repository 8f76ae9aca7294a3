//! Edge Decision Pipeline
//!
//! ## Overview
//!
//! [`EdgePipeline`] is the per-device processing loop. Each call to
//! [`EdgePipeline::handle`] takes one reading to completion:
//!
//! ```text
//! Reading
//!   │ validate ──────────────────────────────► Err(InvalidReading), state untouched
//!   ▼
//! WindowedHistory.append (measurements + health)
//!   │
//!   ├──► RuleAnomalyDetector ──┐
//!   │                          ├──► DecisionFusion ──► Decision
//!   └──► ClassifierAdapter ────┘                         │
//!                                                        ├──► ActuatorRegistry.activate (primary anomaly)
//!                                                        └──► should_forward → caller sends CloudEvent
//! ```
//!
//! The pipeline never talks to the network. Whether and how a forwarded
//! decision reaches the cloud is up to the caller (see `edgefuse-connectors`).
//!
//! ## Failure Isolation
//!
//! A reading that fails validation is counted as rejected, logged at warn
//! level and dropped. History, actuators and the other counters are left
//! exactly as they were, and the next reading is processed normally.
//!
//! A missing classifier is logged once at debug level; after that the
//! pipeline silently runs rules-only. A classifier that errors on a reading
//! is logged at warn level and skipped for that reading only.
//!
//! ## Threading
//!
//! A pipeline is `Send` and owns all of its state. Run one per thread or per
//! task; nothing is shared between pipelines.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorRegistry;
use crate::aggregator::CloudEvent;
use crate::buffer::RingBuffer;
use crate::classifier::{ClassifierAdapter, ClassifierResult};
use crate::config::EdgeConfig;
use crate::constants::detection::CHANNEL_HEALTH;
use crate::constants::forwarding::PROCESSING_TIME_SAMPLES;
use crate::detector::RuleAnomalyDetector;
use crate::errors::{EdgeError, EdgeResult};
use crate::fusion::{Decision, DecisionFusion};
use crate::history::WindowedHistory;
use crate::reading::Reading;
use crate::time::TimeSource;
use crate::traits::Classifier;

/// Running counters of one pipeline
#[derive(Debug, Clone)]
pub struct EdgeMetrics {
    /// Readings taken to completion
    pub processed: u64,
    /// Readings dropped by validation
    pub rejected: u64,
    /// Anomalies raised by rules
    pub rule_anomalies: u64,
    /// Anomalies raised by the classifier
    pub classifier_anomalies: u64,
    /// Decisions marked for forwarding
    pub forwarded: u64,
    /// Actuator commands emitted
    pub actuator_commands: u64,
    /// Actuator activations performed
    pub activations: u64,
    processing_ms: RingBuffer<f64>,
}

impl EdgeMetrics {
    fn new() -> Self {
        Self {
            processed: 0,
            rejected: 0,
            rule_anomalies: 0,
            classifier_anomalies: 0,
            forwarded: 0,
            actuator_commands: 0,
            activations: 0,
            processing_ms: RingBuffer::with_capacity(PROCESSING_TIME_SAMPLES),
        }
    }

    /// All anomalies, rules and classifier
    pub fn anomalies(&self) -> u64 {
        self.rule_anomalies + self.classifier_anomalies
    }

    /// Share of processed readings that were *not* forwarded, in percent
    pub fn data_reduction_pct(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (1.0 - self.forwarded as f64 / self.processed as f64) * 100.0
    }

    /// Mean processing time over the recent window, in milliseconds
    pub fn avg_processing_ms(&self) -> f64 {
        if self.processing_ms.is_empty() {
            return 0.0;
        }
        self.processing_ms.iter().sum::<f64>() / self.processing_ms.len() as f64
    }

    /// Fastest recent processing time, in milliseconds
    pub fn min_processing_ms(&self) -> f64 {
        self.processing_ms.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    /// Slowest recent processing time, in milliseconds
    pub fn max_processing_ms(&self) -> f64 {
        self.processing_ms.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Serializable copy of the counters and derived figures
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            processed: self.processed,
            rejected: self.rejected,
            anomalies: self.anomalies(),
            rule_anomalies: self.rule_anomalies,
            classifier_anomalies: self.classifier_anomalies,
            forwarded: self.forwarded,
            actuator_commands: self.actuator_commands,
            activations: self.activations,
            avg_processing_ms: self.avg_processing_ms(),
            min_processing_ms: self.min_processing_ms(),
            max_processing_ms: self.max_processing_ms(),
            data_reduction_pct: self.data_reduction_pct(),
        }
    }

    fn record(&mut self, decision: &Decision, rule_count: usize, elapsed_ms: f64) {
        self.processed += 1;
        self.rule_anomalies += rule_count as u64;
        self.classifier_anomalies += (decision.anomalies.len() - rule_count) as u64;
        self.actuator_commands += decision.actuator_commands.len() as u64;
        if decision.should_forward {
            self.forwarded += 1;
        }
        self.processing_ms.push(elapsed_ms);
    }
}

/// Point-in-time view of [`EdgeMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MetricsSummary {
    pub processed: u64,
    pub rejected: u64,
    pub anomalies: u64,
    pub rule_anomalies: u64,
    pub classifier_anomalies: u64,
    pub forwarded: u64,
    pub actuator_commands: u64,
    pub activations: u64,
    pub avg_processing_ms: f64,
    pub min_processing_ms: f64,
    pub max_processing_ms: f64,
    pub data_reduction_pct: f64,
}

/// Per-device edge processing pipeline
#[derive(Debug)]
pub struct EdgePipeline {
    config: EdgeConfig,
    history: WindowedHistory,
    detector: RuleAnomalyDetector,
    classifier: ClassifierAdapter,
    fusion: DecisionFusion,
    actuators: ActuatorRegistry,
    metrics: EdgeMetrics,
    classifier_reported: bool,
}

impl EdgePipeline {
    /// Build a rules-only pipeline
    pub fn new(config: EdgeConfig) -> Self {
        Self {
            history: WindowedHistory::new(config.window_size),
            detector: RuleAnomalyDetector::new(config.rules.clone()),
            classifier: ClassifierAdapter::unavailable(),
            fusion: DecisionFusion::new(config.fusion),
            actuators: ActuatorRegistry::new(),
            metrics: EdgeMetrics::new(),
            classifier_reported: false,
            config,
        }
    }

    /// Validate the config, then build
    pub fn try_new(config: EdgeConfig) -> EdgeResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach a classifier backend
    pub fn with_classifier(mut self, backend: Box<dyn Classifier>) -> Self {
        self.classifier = ClassifierAdapter::new(backend);
        self
    }

    /// Attach a prepared adapter (possibly without a backend)
    pub fn with_classifier_adapter(mut self, adapter: ClassifierAdapter) -> Self {
        self.classifier = adapter;
        self
    }

    /// Stamp actuator activations with a custom clock
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.actuators.set_time_source(clock);
        self
    }

    /// Process one reading to completion
    pub fn handle(&mut self, reading: &Reading) -> EdgeResult<Decision> {
        let started = Instant::now();

        if let Err(err) = reading.validate() {
            self.metrics.rejected += 1;
            log_warn!(
                "rejected reading from node {} cycle {}: {}",
                reading.node_id,
                reading.cycle,
                err
            );
            return Err(err);
        }

        for (channel, value) in reading.channels() {
            self.history.append(reading.node_id, channel, value);
        }
        self.history.append(reading.node_id, CHANNEL_HEALTH, reading.health);

        let anomalies = self.detector.detect(reading, &self.history);
        let rule_count = anomalies.len();
        let classification = self.classify(reading);
        let decision = self.fusion.fuse(reading, anomalies, classification);

        if let Some(primary) = decision.primary() {
            self.actuators
                .activate(reading.node_id, &primary.explanation, primary.severity);
            self.metrics.activations += 1;
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record(&decision, rule_count, elapsed_ms);

        if decision.has_anomaly() {
            log_debug!(
                "node {} cycle {}: {} anomalies, max severity {:?}",
                decision.node_id,
                decision.cycle,
                decision.anomalies.len(),
                decision.max_severity()
            );
        }

        Ok(decision)
    }

    /// Decode a JSON reading and process it
    ///
    /// Payloads that fail to decode count as rejected, like readings that
    /// fail validation.
    pub fn handle_json(&mut self, payload: &[u8]) -> EdgeResult<Decision> {
        let reading = self.decode(payload)?;
        self.handle(&reading)
    }

    /// Decode a JSON reading, counting failures as rejected
    pub fn decode(&mut self, payload: &[u8]) -> EdgeResult<Reading> {
        Reading::from_json(payload).map_err(|err| {
            self.metrics.rejected += 1;
            log_warn!("rejected payload: {}", err);
            err
        })
    }

    /// Envelope for forwarding a decision to the cloud
    pub fn cloud_event(&self, reading: &Reading, decision: &Decision) -> CloudEvent {
        CloudEvent::new(&self.config.device_id, reading, decision.anomalies.clone())
    }

    /// Active configuration
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Counters so far
    pub fn metrics(&self) -> &EdgeMetrics {
        &self.metrics
    }

    /// Actuators driven by this pipeline
    pub fn actuators(&self) -> &ActuatorRegistry {
        &self.actuators
    }

    /// Mutable actuator access, e.g. to reset one
    pub fn actuators_mut(&mut self) -> &mut ActuatorRegistry {
        &mut self.actuators
    }

    /// Rolling history
    pub fn history(&self) -> &WindowedHistory {
        &self.history
    }

    /// Whether a classifier backend is attached
    pub fn has_classifier(&self) -> bool {
        self.classifier.is_available()
    }

    fn classify(&mut self, reading: &Reading) -> Option<ClassifierResult> {
        match self.classifier.score_reading(reading) {
            Ok(result) => Some(result),
            Err(EdgeError::ModelUnavailable) => {
                if !self.classifier_reported {
                    log_debug!("no classifier loaded; running rules only");
                    self.classifier_reported = true;
                }
                None
            }
            Err(err) => {
                log_warn!(
                    "classifier failed on node {} cycle {}: {}",
                    reading.node_id,
                    reading.cycle,
                    err
                );
                None
            }
        }
    }
}

impl Default for EdgePipeline {
    fn default() -> Self {
        Self::new(EdgeConfig::default())
    }
}
