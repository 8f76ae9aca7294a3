//! Edge node runtime
//!
//! [`EdgeNode`] is the glue around one [`EdgePipeline`]:
//!
//! ```text
//!  sensor payload ──► Reading ──► EdgePipeline::handle ──► Decision
//!                                                           │
//!                      ActuatorSink::command ◄── commands ──┤
//!   connector: iot/actuators/{node}/command ◄── payloads ───┤
//!   connector: iot/cloud/alerts ◄──── CloudEvent (forward) ─┘
//! ```
//!
//! Once the pipeline has accepted a reading, nothing downstream fails it.
//! The decision has already been taken and applied locally, so a refused
//! actuator command or a lost forward is logged, counted in [`NodeStats`]
//! and the remaining commands and the forward still go out.
//!
//! [`CloudOnlyForwarder`] is the comparison architecture: it ships every raw
//! reading upstream on `iot/sensors/{node}/data` and leaves detection to the
//! cloud.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use edgefuse_core::{
    constants::TOPIC_CLOUD_ALERTS,
    fusion::ActuatorCommand,
    time::{SystemTime, TimeSource},
    ActuatorSink, CloudEvent, CloudOnlyBaseline, Decision, EdgePipeline, EdgeResult, Reading,
};

use crate::{Connector, ConnectorError};

/// Counters of one node's traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Readings accepted by the pipeline
    pub readings: u64,
    /// Payloads or readings rejected
    pub rejected: u64,
    /// Cloud events published
    pub events_published: u64,
    /// Actuator commands published
    pub commands_published: u64,
    /// Publishes the connector refused
    pub send_failures: u64,
    /// Commands the actuator sink refused
    pub sink_failures: u64,
}

/// One edge device: pipeline, uplink and actuators
pub struct EdgeNode<C, S = Vec<ActuatorCommand>> {
    pipeline: EdgePipeline,
    connector: C,
    sink: S,
    clock: Arc<dyn TimeSource>,
    publish_commands: bool,
    stats: NodeStats,
}

impl<C: Connector> EdgeNode<C> {
    /// Node that collects actuator commands in memory
    pub fn new(pipeline: EdgePipeline, connector: C) -> Self {
        Self::with_sink(pipeline, connector, Vec::new())
    }
}

impl<C: Connector, S: ActuatorSink> EdgeNode<C, S> {
    /// Node delivering commands to `sink`
    pub fn with_sink(pipeline: EdgePipeline, connector: C, sink: S) -> Self {
        Self {
            pipeline,
            connector,
            sink,
            clock: Arc::new(SystemTime),
            publish_commands: true,
            stats: NodeStats::default(),
        }
    }

    /// Stamp command payloads with a custom clock
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether commands are also published on their actuator topics
    pub fn publish_commands(mut self, enabled: bool) -> Self {
        self.publish_commands = enabled;
        self
    }

    /// Run one reading through the node
    ///
    /// Errors only when the pipeline rejects the reading.
    pub async fn process(&mut self, reading: &Reading) -> Result<Decision, ConnectorError> {
        let decision = match self.pipeline.handle(reading) {
            Ok(decision) => decision,
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e.into());
            }
        };
        self.stats.readings += 1;

        for command in &decision.actuator_commands {
            if let Err(e) = self.sink.command(command.node_id, command.action) {
                self.stats.sink_failures += 1;
                log_warn!(
                    "actuator sink refused {:?} for node {}: {}",
                    command.action,
                    command.node_id,
                    e
                );
            }

            if self.publish_commands {
                let payload = command.to_payload(self.clock.now());
                if self.publish(&command.topic(), payload).await {
                    self.stats.commands_published += 1;
                }
            }
        }

        if decision.should_forward {
            let payload = self.pipeline.cloud_event(reading, &decision).to_json();
            if self.publish(TOPIC_CLOUD_ALERTS, payload).await {
                self.stats.events_published += 1;
            }
        }

        Ok(decision)
    }

    /// Decode a raw sensor payload and process it
    ///
    /// Undecodable payloads count as rejected both here and in the
    /// pipeline's metrics.
    pub async fn process_payload(&mut self, payload: &[u8]) -> Result<Decision, ConnectorError> {
        let reading = match self.pipeline.decode(payload) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e.into());
            }
        };
        self.process(&reading).await
    }

    /// Process payloads until the channel closes
    ///
    /// A bad payload is logged and skipped. Returns the number of readings
    /// that made it through the pipeline.
    pub async fn run(&mut self, mut payloads: mpsc::Receiver<Vec<u8>>) -> u64 {
        let mut processed = 0;
        while let Some(payload) = payloads.recv().await {
            match self.process_payload(&payload).await {
                Ok(_) => processed += 1,
                Err(e) => log_debug!("payload skipped: {}", e),
            }
        }
        processed
    }

    async fn publish(&mut self, topic: &str, payload: EdgeResult<Vec<u8>>) -> bool {
        let sent = match payload {
            Ok(payload) => self.connector.send(topic, &payload).await,
            Err(e) => Err(e.into()),
        };
        match sent {
            Ok(()) => true,
            Err(e) => {
                self.stats.send_failures += 1;
                log_warn!("publish to {} failed: {}", topic, e);
                false
            }
        }
    }

    /// The pipeline
    pub fn pipeline(&self) -> &EdgePipeline {
        &self.pipeline
    }

    /// The connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Mutable connector access
    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    /// The actuator sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Traffic counters
    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Take the node apart
    pub fn into_parts(self) -> (EdgePipeline, C, S) {
        (self.pipeline, self.connector, self.sink)
    }
}

/// Cloud-only architecture: every reading goes upstream
pub struct CloudOnlyForwarder<C> {
    connector: C,
    baseline: CloudOnlyBaseline,
    send_failures: u64,
}

impl<C: Connector> CloudOnlyForwarder<C> {
    /// Forwarder over `connector` with cloud-side rules from `baseline`
    pub fn new(connector: C, baseline: CloudOnlyBaseline) -> Self {
        Self {
            connector,
            baseline,
            send_failures: 0,
        }
    }

    /// Ship one raw reading and evaluate it cloud-side
    pub async fn process(&mut self, reading: &Reading) -> Result<CloudEvent, ConnectorError> {
        let payload = reading.to_json()?;
        if let Err(e) = self.connector.send(&reading.topic(), &payload).await {
            self.send_failures += 1;
            log_warn!("raw forward for node {} failed: {}", reading.node_id, e);
        }
        Ok(self.baseline.process(reading)?)
    }

    /// Cloud-side state
    pub fn baseline(&self) -> &CloudOnlyBaseline {
        &self.baseline
    }

    /// The connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Publishes the connector refused
    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }
}
