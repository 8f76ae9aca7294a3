//! Scoring Readings with a Model Bundle
//!
//! Loads a model bundle (from the path given on the command line, or a small
//! built-in isolation forest) and runs a handful of readings through an edge
//! pipeline with the classifier attached.
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=info cargo run --example 02_model_bundle -- models/anomaly_detector.json
//! ```

use edgefuse_core::{classifier::ClassifierAdapter, EdgePipeline, Reading};
use edgefuse_ml::ModelBundle;

const BUILT_IN: &str = r#"{
    "scaler": { "mean": [540.0, 665.0, 15.0, 0.05, 2400.0],
                "scale": [10.0, 10.0, 1.0, 0.01, 50.0] },
    "model": {
        "type": "isolation_forest",
        "max_samples": 256,
        "threshold": 0.6,
        "trees": [
            { "nodes": [
                { "type": "internal", "feature": 3, "threshold": 3.0, "left": 1, "right": 2 },
                { "type": "leaf", "size": 250 },
                { "type": "leaf", "size": 1 }
            ] },
            { "nodes": [
                { "type": "internal", "feature": 0, "threshold": 2.5, "left": 1, "right": 2 },
                { "type": "leaf", "size": 245 },
                { "type": "leaf", "size": 3 }
            ] }
        ]
    }
}"#;

fn adapter() -> ClassifierAdapter {
    match std::env::args().nth(1) {
        Some(path) => ModelBundle::load_adapter(path),
        None => match ModelBundle::from_json_str(BUILT_IN) {
            Ok(bundle) => bundle.into_adapter(),
            Err(e) => {
                println!("built-in model rejected: {}", e);
                ClassifierAdapter::unavailable()
            }
        },
    }
}

fn main() {
    env_logger::init();

    let adapter = adapter();
    println!("Classifier: {}", adapter.backend_name().unwrap_or("none"));
    let mut pipeline = EdgePipeline::default().with_classifier_adapter(adapter);

    let samples = [
        ("nominal", 540.0, 0.05),
        ("warm", 566.0, 0.05),
        ("shaking", 540.0, 0.085),
    ];

    for (cycle, (label, temperature, vibration)) in samples.iter().enumerate() {
        let reading = Reading::builder(1, cycle as u64 + 1)
            .measurement("temperature_1", *temperature)
            .measurement("temperature_2", 665.0)
            .measurement("pressure", 15.0)
            .measurement("vibration", *vibration)
            .measurement("rpm", 2400.0)
            .health(85.0)
            .build();

        match pipeline.handle(&reading) {
            Ok(decision) => {
                println!("{:<8} forward={} anomalies:", label, decision.should_forward);
                for anomaly in &decision.anomalies {
                    println!("    {:?} {:?}: {}", anomaly.severity, anomaly.kind, anomaly.explanation);
                }
            }
            Err(e) => println!("{:<8} rejected: {}", label, e),
        }
    }

    println!("\nClassifier anomalies: {}", pipeline.metrics().classifier_anomalies);
}
