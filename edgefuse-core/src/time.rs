//! Time management for edge nodes
//!
//! Provides clock abstraction so actuator logs and aggregator arrivals can be
//! stamped from different sources:
//! - System clock (wall time on the gateway)
//! - Fixed clock (tests, replays)
//! - Mock clock that ticks on every read (deterministic simulations)

use core::sync::atomic::{AtomicU64, Ordering};

/// Timestamp in milliseconds since epoch (or since start for simulated clocks)
pub type Timestamp = u64;

/// Source of time for the system
///
/// Sources are shared between node pipelines and the aggregator, so they
/// must be usable from several threads at once.
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs simulated)
    fn is_wall_clock(&self) -> bool;
}

/// System time source
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Move the clock to an absolute time
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move the clock forward
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Clock that advances by a fixed step every time it is read
///
/// Useful for simulations where every event needs a distinct, ordered stamp
/// without depending on the host clock.
#[derive(Debug)]
pub struct MockTimeSource {
    current: AtomicU64,
    step_ms: u64,
}

impl MockTimeSource {
    /// Start at `start`, advancing 1ms per read
    pub fn new(start: Timestamp) -> Self {
        Self::with_step(start, 1)
    }

    /// Start at `start`, advancing `step_ms` per read
    pub fn with_step(start: Timestamp, step_ms: u64) -> Self {
        Self {
            current: AtomicU64::new(start),
            step_ms,
        }
    }

    /// Jump forward without producing a reading
    pub fn advance(&self, ms: u64) {
        self.current.fetch_add(ms, Ordering::Relaxed);
    }

    /// Peek at the next timestamp without consuming it
    pub fn peek(&self) -> Timestamp {
        self.current.load(Ordering::Relaxed)
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.current.fetch_add(self.step_ms, Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
