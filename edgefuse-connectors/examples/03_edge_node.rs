//! Edge Nodes over a Channel Uplink
//!
//! Three simulated machines each run an `EdgeNode`. All of them publish into
//! one tokio channel; a cloud task drains it into a `CloudAggregator`.
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=edgefuse_connectors=debug cargo run --example 03_edge_node
//! ```

use std::sync::Arc;

use edgefuse_connectors::{ChannelConnector, Connector, EdgeNode, Message};
use edgefuse_core::{
    constants::TOPIC_CLOUD_ALERTS, CloudAggregator, EdgePipeline, NodeId, ProtocolProfile, Reading,
};
use tokio::sync::mpsc;

const CYCLES: u64 = 120;

fn reading(node_id: NodeId, cycle: u64) -> Reading {
    let wear = cycle as f64 / CYCLES as f64;
    Reading::builder(node_id, cycle)
        .timestamp(cycle * 1_000)
        .measurement("temperature_1", 520.0 + wear * 40.0)
        .measurement("temperature_2", 640.0 + wear * 50.0)
        .measurement("pressure", 14.5 + wear * 2.0)
        .measurement("vibration", 0.02 + wear * 0.08)
        .measurement("rpm", 2300.0 + wear * 200.0)
        .health(100.0 - wear * 100.0)
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let aggregator = Arc::new(CloudAggregator::new());
    let (tx, mut uplink) = mpsc::channel::<Message>(64);

    let cloud = {
        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move {
            let mut commands = 0u64;
            while let Some(message) = uplink.recv().await {
                if message.topic == TOPIC_CLOUD_ALERTS {
                    if let Err(e) = aggregator.receive_payload(&message.payload) {
                        println!("cloud rejected event: {}", e);
                    }
                } else {
                    commands += 1;
                }
            }
            commands
        })
    };

    let mut wire_bytes = 0;
    for node_id in 1..=3 {
        let connector = ChannelConnector::from_sender(tx.clone());
        let mut node = EdgeNode::new(EdgePipeline::default(), connector);

        for cycle in 1..=CYCLES {
            if let Err(e) = node.process(&reading(node_id, cycle)).await {
                println!("node {} cycle {}: {}", node_id, cycle, e);
            }
        }

        let stats = node.stats();
        wire_bytes += node.connector().stats().wire_bytes(ProtocolProfile::Mqtt);
        println!(
            "Node {}: {} readings, {} events, {} commands, {} actuator activations",
            node_id,
            stats.readings,
            stats.events_published,
            stats.commands_published,
            node.pipeline().metrics().activations
        );
    }
    drop(tx);

    let commands = cloud.await.unwrap_or_default();
    let snapshot = aggregator.snapshot();
    println!("\nCloud aggregator");
    println!("  events:          {}", snapshot.total_messages);
    println!("  with anomalies:  {}", snapshot.anomaly_messages);
    println!("  critical alerts: {}", snapshot.critical_alerts);
    println!("  command traffic: {}", commands);
    println!("  bytes over MQTT: {}", wire_bytes);
}
