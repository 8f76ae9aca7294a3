//! Error Types for the Edge Decision Pipeline
//!
//! ## Design Philosophy
//!
//! Every error in this crate is scoped to a single reading or a single
//! operation. Nothing here is allowed to take the node down:
//!
//! 1. **Recoverable by default**: `InsufficientData` and `ModelUnavailable`
//!    are expected during normal operation (warm-up, no model deployed) and
//!    callers fall back to a reduced check set.
//!
//! 2. **Fault isolation**: `InvalidReading` rejects exactly one reading.
//!    Validation happens before any history or actuator mutation, so a
//!    rejected reading leaves no trace in node state.
//!
//! 3. **Programming errors are loud in debug only**: `AggregatorWriteConflict`
//!    can only appear when the aggregator lock discipline is broken.
//!
//! ## Error Categories
//!
//! ### Data Availability
//! - `InsufficientData`: Window shorter than the statistic needs
//! - `ModelUnavailable`: No classifier backend loaded
//!
//! ### Input
//! - `InvalidReading`: Missing node id, non-numeric or non-finite value,
//!   health outside `[0, 100]`
//!
//! ### System
//! - `AggregatorWriteConflict`: Shared aggregator state was poisoned
//! - `InvalidConfig`: Configuration rejected at load time
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use edgefuse_core::{EdgeError, EdgePipeline, EdgeConfig, Reading};
//!
//! fn on_reading(pipeline: &mut EdgePipeline, reading: &Reading) {
//!     match pipeline.handle(reading) {
//!         Ok(decision) => {
//!             // Forward / actuate according to the decision
//!         }
//!         Err(EdgeError::InvalidReading { .. }) => {
//!             // Drop this reading, keep going with the next one
//!         }
//!         Err(_) => {
//!             // Log and investigate
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for pipeline operations
pub type EdgeResult<T> = Result<T, EdgeError>;

/// Errors raised by the edge decision pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    /// Not enough history for the requested statistic
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Number of samples the statistic needs
        required: usize,
        /// Number of samples currently in the window
        available: usize,
    },

    /// No classifier backend is loaded
    #[error("Classifier model unavailable")]
    ModelUnavailable,

    /// Reading is malformed and was rejected
    #[error("Invalid reading: {reason}")]
    InvalidReading {
        /// What was wrong with the reading
        reason: String,
    },

    /// Aggregator state was accessed without the serialization discipline
    #[error("Aggregator write conflict")]
    AggregatorWriteConflict,

    /// Configuration failed validation or could not be parsed
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },
}

impl EdgeError {
    /// Shorthand for an `InvalidReading` error
    pub fn invalid_reading(reason: impl Into<String>) -> Self {
        Self::InvalidReading { reason: reason.into() }
    }

    /// Shorthand for an `InvalidConfig` error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }

    /// Whether the caller can keep processing after this error
    ///
    /// Everything except a broken aggregator lock is scoped to one reading.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::AggregatorWriteConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = EdgeError::InsufficientData { required: 5, available: 2 };
        assert_eq!(err.to_string(), "Insufficient data: need 5, have 2");

        let err = EdgeError::invalid_reading("missing node_id");
        assert_eq!(err.to_string(), "Invalid reading: missing node_id");
    }

    #[test]
    fn recoverability() {
        assert!(EdgeError::ModelUnavailable.is_recoverable());
        assert!(EdgeError::invalid_reading("x").is_recoverable());
        assert!(!EdgeError::AggregatorWriteConflict.is_recoverable());
    }
}
