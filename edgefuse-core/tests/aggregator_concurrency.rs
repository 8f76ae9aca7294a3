//! One pipeline per node thread, all forwarding into a shared aggregator

mod common;

use std::sync::Arc;
use std::thread;

use edgefuse_core::{aggregator::CloudAggregator, EdgePipeline};

use common::DegradingNode;

const NODES: u32 = 4;
const CYCLES: u64 = 250;

#[test]
fn concurrent_nodes_lose_no_updates() {
    let aggregator = Arc::new(CloudAggregator::new());

    let handles: Vec<_> = (1..=NODES)
        .map(|node_id| {
            let aggregator = Arc::clone(&aggregator);
            thread::spawn(move || {
                let mut pipeline = EdgePipeline::default();
                let mut node = DegradingNode::new(node_id, CYCLES);
                while let Some(reading) = node.next_reading() {
                    let decision = pipeline.handle(&reading).unwrap();
                    if decision.should_forward {
                        aggregator.receive(pipeline.cloud_event(&reading, &decision));
                    }
                }
                pipeline.metrics().forwarded
            })
        })
        .collect();

    let forwarded: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let stats = aggregator.snapshot();
    assert_eq!(stats.total_messages, forwarded);
    assert_eq!(stats.total_messages, stats.anomaly_messages + stats.normal_messages);
    assert_eq!(aggregator.nodes_online(), NODES as usize);

    for node_id in 1..=NODES {
        assert_eq!(aggregator.node_status(node_id).unwrap().last_cycle, CYCLES);
    }
}

#[test]
fn many_writers_many_readers() {
    let aggregator = Arc::new(CloudAggregator::with_capacity(50));
    let reading = common::nominal(1, 10);
    let event = EdgePipeline::default().cloud_event(
        &reading,
        &edgefuse_core::Decision {
            node_id: 1,
            cycle: 10,
            should_forward: true,
            actuator_commands: Vec::new(),
            anomalies: Vec::new(),
        },
    );

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let aggregator = Arc::clone(&aggregator);
            let event = event.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    aggregator.receive(event.clone());
                }
            })
        })
        .collect();

    let reader = {
        let aggregator = Arc::clone(&aggregator);
        thread::spawn(move || {
            for _ in 0..200 {
                let stats = aggregator.snapshot();
                assert_eq!(stats.total_messages, stats.normal_messages);
                assert!(aggregator.recent(100).len() <= 50);
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(aggregator.snapshot().total_messages, 4_000);
    assert_eq!(aggregator.recent(100).len(), 50);
}
