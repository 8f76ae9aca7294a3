//! Edge vs Cloud-Only Comparison
//!
//! Runs four wearing machines through an edge pipeline and through a
//! cloud-only baseline, then compares forwarded traffic and detections.
//!
//! ## What You'll See
//!
//! - How many readings the edge device keeps local
//! - Actuator activity on each side
//! - Bytes on the wire under MQTT and HTTP pricing
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=edgefuse_core=debug cargo run --example 01_edge_vs_cloud
//! ```

use std::sync::Arc;

use edgefuse_core::{
    baseline::{ArchitectureReport, CloudOnlyBaseline, ProtocolProfile},
    CloudAggregator, EdgeConfig, EdgePipeline, NodeId, Reading,
};

const NODES: NodeId = 4;
const CYCLES: u64 = 200;

/// Turbofan-style wear: channels drift up, health falls to zero
struct WearingMachine {
    node_id: NodeId,
    cycle: u64,
    seed: u32,
}

impl WearingMachine {
    fn new(node_id: NodeId) -> Self {
        Self { node_id, cycle: 0, seed: 7 * node_id + 1 }
    }

    fn noise(&mut self, spread: f64) -> f64 {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.seed as f64 / u32::MAX as f64 - 0.5) * 2.0 * spread
    }

    fn next_reading(&mut self) -> Option<Reading> {
        if self.cycle >= CYCLES {
            return None;
        }
        self.cycle += 1;
        let wear = self.cycle as f64 / CYCLES as f64;

        Some(
            Reading::builder(self.node_id, self.cycle)
                .timestamp(self.cycle * 1_000)
                .measurement("temperature_1", 520.0 + wear * 40.0 + self.noise(2.0))
                .measurement("temperature_2", 640.0 + wear * 50.0 + self.noise(3.0))
                .measurement("pressure", 14.5 + wear * 2.0 + self.noise(0.3))
                .measurement("vibration", 0.02 + wear * 0.08 + self.noise(0.005))
                .measurement("rpm", 2300.0 + wear * 200.0 + self.noise(20.0))
                .health((100.0 - wear * 100.0).max(0.0))
                .build(),
        )
    }
}

fn main() {
    env_logger::init();

    println!("EdgeFuse: Edge vs Cloud-Only");
    println!("============================\n");

    let config = EdgeConfig::default();
    let aggregator = Arc::new(CloudAggregator::with_capacity(config.aggregator_capacity));
    let mut pipeline = EdgePipeline::new(config.clone());
    let mut baseline = CloudOnlyBaseline::new(config.rules.clone());

    for node_id in 1..=NODES {
        let mut machine = WearingMachine::new(node_id);
        while let Some(reading) = machine.next_reading() {
            match pipeline.handle(&reading) {
                Ok(decision) if decision.should_forward => {
                    aggregator.receive(pipeline.cloud_event(&reading, &decision));
                }
                Ok(_) => {}
                Err(e) => println!("  rejected node {} cycle {}: {}", node_id, reading.cycle, e),
            }

            if let Err(e) = baseline.process(&reading) {
                println!("  cloud rejected node {} cycle {}: {}", node_id, reading.cycle, e);
            }
        }
        println!("Node {} done ({} cycles)", node_id, CYCLES);
    }

    let metrics = pipeline.metrics().summary();
    println!("\nEdge pipeline");
    println!("-------------");
    println!("Processed:           {}", metrics.processed);
    println!("Forwarded:           {}", metrics.forwarded);
    println!("Data reduction:      {:.1}%", metrics.data_reduction_pct);
    println!("Anomalies:           {}", metrics.anomalies);
    println!("Actuator commands:   {}", metrics.actuator_commands);
    println!("Activations:         {}", metrics.activations);
    println!("Avg processing time: {:.4} ms", metrics.avg_processing_ms);

    let stats = aggregator.snapshot();
    println!("\nCloud aggregator");
    println!("----------------");
    println!("Messages:        {}", stats.total_messages);
    println!("With anomalies:  {}", stats.anomaly_messages);
    println!("Critical alerts: {}", stats.critical_alerts);
    println!("Warnings:        {}", stats.warnings);
    println!("Nodes online:    {}", aggregator.nodes_online());

    let report = ArchitectureReport::compare(pipeline.metrics(), &baseline);
    println!("\nComparison");
    println!("----------");
    println!("{:<22} {:>10} {:>10}", "", "edge", "cloud");
    println!("{:<22} {:>10} {:>10}", "Messages forwarded", report.edge.messages_forwarded, report.cloud.messages_forwarded);
    println!("{:<22} {:>10} {:>10}", "Anomalies", report.edge.anomalies, report.cloud.anomalies);
    println!("{:<22} {:>10} {:>10}", "Activations", report.edge.activations, report.cloud.activations);
    println!("Messages saved: {}", report.messages_saved());

    for (label, cloud_profile) in [("MQTT", ProtocolProfile::Mqtt), ("HTTP", ProtocolProfile::Http)] {
        let priced = report.with_profiles(ProtocolProfile::Mqtt, cloud_profile);
        println!(
            "Cloud over {}: {} B vs edge {} B ({:.1}% saved)",
            label,
            priced.cloud_bytes(),
            priced.edge_bytes(),
            priced.bandwidth_saving_pct()
        );
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("\nReport JSON:\n{}", json),
        Err(e) => println!("\nreport not serializable: {}", e),
    }
}
