//! Edge nodes, transports and the cloud aggregator wired together

use std::sync::Arc;

use tokio::sync::mpsc;

use edgefuse_connectors::{
    AggregatorConnector, ChannelConnector, CloudOnlyForwarder, Connector, EdgeNode, MemoryConnector,
};
use edgefuse_core::{
    constants::TOPIC_CLOUD_ALERTS, CloudAggregator, CloudOnlyBaseline, EdgePipeline, NodeId,
    ProtocolProfile, Reading,
};

fn nominal(node_id: NodeId, cycle: u64) -> Reading {
    Reading::builder(node_id, cycle)
        .timestamp(cycle * 1_000)
        .measurement("temperature_1", 540.0)
        .measurement("temperature_2", 670.0)
        .measurement("pressure", 15.0)
        .measurement("vibration", 0.05)
        .measurement("rpm", 2400.0)
        .health(90.0)
        .build()
}

fn worn(node_id: NodeId, cycle: u64) -> Reading {
    Reading::builder(node_id, cycle)
        .timestamp(cycle * 1_000)
        .measurement("temperature_1", 555.0)
        .measurement("temperature_2", 685.0)
        .measurement("pressure", 15.8)
        .measurement("vibration", 0.075)
        .measurement("rpm", 2420.0)
        .health(25.0)
        .build()
}

/// Quiet machine with a worn reading every 25 cycles
fn stream(node_id: NodeId, cycles: u64) -> Vec<Reading> {
    (1..=cycles)
        .map(|cycle| {
            if cycle % 25 == 0 {
                worn(node_id, cycle)
            } else {
                nominal(node_id, cycle)
            }
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn edge_nodes_feed_shared_aggregator() {
    let aggregator = Arc::new(CloudAggregator::new());

    let tasks: Vec<_> = (1..=3)
        .map(|node_id| {
            let connector = AggregatorConnector::new(Arc::clone(&aggregator));
            tokio::spawn(async move {
                let mut node = EdgeNode::new(EdgePipeline::default(), connector);
                for reading in stream(node_id, 100) {
                    node.process(&reading).await.unwrap();
                }
                node.stats()
            })
        })
        .collect();

    let mut published = 0;
    for task in tasks {
        let stats = task.await.unwrap();
        assert_eq!(stats.readings, 100);
        assert_eq!(stats.send_failures, 0);
        published += stats.events_published;
    }

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.total_messages, published);
    assert_eq!(snapshot.total_messages, snapshot.anomaly_messages + snapshot.normal_messages);
    assert_eq!(aggregator.nodes_online(), 3);
    for node_id in 1..=3 {
        assert_eq!(aggregator.node_status(node_id).unwrap().last_cycle, 100);
    }
}

#[tokio::test]
async fn channel_uplink_to_cloud_task() {
    let aggregator = Arc::new(CloudAggregator::new());
    let (connector, mut uplink) = ChannelConnector::new(8);

    let cloud = {
        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move {
            let mut commands = 0u64;
            while let Some(message) = uplink.recv().await {
                if message.topic == TOPIC_CLOUD_ALERTS {
                    aggregator.receive_payload(&message.payload).unwrap();
                } else {
                    assert!(message.topic.starts_with("iot/actuators/7/"));
                    commands += 1;
                }
            }
            commands
        })
    };

    let mut node = EdgeNode::new(EdgePipeline::default(), connector);
    for reading in stream(7, 50) {
        node.process(&reading).await.unwrap();
    }
    let stats = node.stats();
    let (_, _, sink) = node.into_parts();

    // Dropping the node closes the channel and ends the cloud task
    let commands = cloud.await.unwrap();
    assert_eq!(commands, stats.commands_published);
    assert_eq!(commands, sink.len() as u64);
    assert_eq!(aggregator.snapshot().total_messages, stats.events_published);
    assert!(aggregator.snapshot().anomaly_messages >= 2);
}

#[tokio::test]
async fn run_consumes_sensor_payloads() {
    let (tx, rx) = mpsc::channel(16);
    for reading in stream(2, 12) {
        tx.send(reading.to_json().unwrap()).await.unwrap();
    }
    tx.send(b"garbage".to_vec()).await.unwrap();
    tx.send(br#"{"node_id":2,"cycle":13,"health":140}"#.to_vec()).await.unwrap();
    drop(tx);

    let mut node = EdgeNode::new(EdgePipeline::default(), MemoryConnector::new());
    let processed = node.run(rx).await;

    assert_eq!(processed, 12);
    assert_eq!(node.stats().rejected, 2);
    assert_eq!(node.pipeline().metrics().rejected, 2);
    // Heartbeat at cycle 10 only
    assert_eq!(node.connector().on_topic(TOPIC_CLOUD_ALERTS).count(), 1);
}

#[tokio::test]
async fn edge_uses_less_bandwidth_than_cloud_only() {
    let mut edge = EdgeNode::new(EdgePipeline::default(), MemoryConnector::new()).publish_commands(false);
    let mut cloud = CloudOnlyForwarder::new(MemoryConnector::new(), CloudOnlyBaseline::default());

    for reading in stream(5, 100) {
        edge.process(&reading).await.unwrap();
        cloud.process(&reading).await.unwrap();
    }

    let edge_stats = edge.connector().stats();
    let cloud_stats = cloud.connector().stats();

    assert_eq!(cloud_stats.messages_sent, 100);
    assert!(edge_stats.messages_sent < cloud_stats.messages_sent);
    assert!(edge_stats.wire_bytes(ProtocolProfile::Mqtt) < cloud_stats.wire_bytes(ProtocolProfile::Mqtt));
    assert!(cloud_stats.wire_bytes(ProtocolProfile::Http) > cloud_stats.wire_bytes(ProtocolProfile::Mqtt));

    // Both architectures see the worn readings
    assert_eq!(cloud.baseline().summary().activations, 4);
    assert!(edge.pipeline().metrics().anomalies() >= cloud.baseline().summary().anomalies);
}

#[tokio::test]
async fn cloud_only_telemetry_reaches_the_aggregator() {
    let aggregator = Arc::new(CloudAggregator::new());
    let mut cloud = CloudOnlyForwarder::new(
        AggregatorConnector::new(Arc::clone(&aggregator)),
        CloudOnlyBaseline::default(),
    );
    let mut edge = EdgeNode::new(
        EdgePipeline::default(),
        AggregatorConnector::new(Arc::clone(&aggregator)),
    );

    for reading in stream(8, 50) {
        cloud.process(&reading).await.unwrap();
    }
    for reading in stream(9, 50) {
        edge.process(&reading).await.unwrap();
    }

    let snapshot = aggregator.snapshot();
    assert_eq!(cloud.send_failures(), 0);
    assert_eq!(snapshot.telemetry_messages, 50);
    assert_eq!(snapshot.total_messages, edge.stats().events_published);
    assert_eq!(aggregator.node_status(8).unwrap().telemetry, 50);
    assert_eq!(aggregator.node_status(8).unwrap().messages, 0);
    assert_eq!(aggregator.node_status(9).unwrap().telemetry, 0);
    assert!(snapshot.by_kind.total() >= snapshot.critical_alerts + snapshot.warnings);
}
