//! Edge decision pipeline for EdgeFuse
//!
//! Turns raw sensor readings into local decisions on resource-constrained
//! edge nodes, and forwards only what the cloud needs to see.
//!
//! Key constraints:
//! - Bounded memory per node (fixed-capacity windows)
//! - Deterministic classification for identical history
//! - One bad reading never stops the node
//!
//! ```no_run
//! use edgefuse_core::{EdgeConfig, EdgePipeline, Reading};
//!
//! let mut pipeline = EdgePipeline::new(EdgeConfig::default());
//!
//! let reading = Reading::builder(1, 150)
//!     .measurement("temperature_1", 555.0)
//!     .measurement("temperature_2", 685.0)
//!     .health(25.0)
//!     .build();
//!
//! match pipeline.handle(&reading) {
//!     Ok(decision) if decision.should_forward => {}, // Send to the aggregator
//!     Ok(_) => {},                                    // Handled locally
//!     Err(_) => {},                                   // Rejected reading
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod actuator;
pub mod aggregator;
pub mod anomaly;
pub mod baseline;
pub mod buffer;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod detector;
pub mod errors;
pub mod fusion;
pub mod history;
pub mod pipeline;
pub mod reading;
pub mod time;
pub mod traits;

// Public API
pub use actuator::{ActuatorKind, ActuatorRegistry, ActuatorState, ActuatorStatus};
pub use aggregator::{
    AggregatorStatistics, CloudAggregator, CloudEvent, EventSummary, KindCounters, NodeStatus,
};
pub use anomaly::{Anomaly, AnomalyKind, Severity};
pub use baseline::{ArchitectureReport, ArchitectureSummary, CloudOnlyBaseline, ProtocolProfile};
pub use classifier::{ClassifierAdapter, ClassifierResult, FeatureVector};
pub use config::EdgeConfig;
pub use detector::{RuleAnomalyDetector, RuleSet};
pub use errors::{EdgeError, EdgeResult};
pub use fusion::{
    ActuatorAction, ActuatorCommand, CommandBatching, Decision, DecisionFusion, FusionPolicy,
};
pub use history::WindowedHistory;
pub use pipeline::{EdgeMetrics, EdgePipeline, MetricsSummary};
pub use reading::{NodeId, Reading};
pub use traits::{ActuatorSink, Classifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
