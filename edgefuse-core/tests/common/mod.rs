//! Shared fixtures for integration tests
//!
//! [`DegradingNode`] replays the wear pattern of a turbofan-style machine:
//! every channel drifts linearly with a degradation factor while health
//! falls from 100 to 0 over the run. Noise comes from a fixed-seed LCG so
//! every test sees the same stream.

#![allow(dead_code)]

use edgefuse_core::{NodeId, Reading};

/// Deterministic pseudo-random source (Numerical Recipes LCG)
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform in [-spread, spread)
    pub fn noise(&mut self, spread: f64) -> f64 {
        (self.next_f64() - 0.5) * 2.0 * spread
    }
}

/// A simulated sensor node wearing out over `total_cycles`
pub struct DegradingNode {
    node_id: NodeId,
    cycle: u64,
    total_cycles: u64,
    rng: Lcg,
}

impl DegradingNode {
    pub fn new(node_id: NodeId, total_cycles: u64) -> Self {
        Self {
            node_id,
            cycle: 0,
            total_cycles: total_cycles.max(1),
            rng: Lcg::new(42 + node_id),
        }
    }

    /// Next reading, or `None` once the machine has run its course
    pub fn next_reading(&mut self) -> Option<Reading> {
        if self.cycle >= self.total_cycles {
            return None;
        }
        self.cycle += 1;

        let wear = self.cycle as f64 / self.total_cycles as f64;
        let reading = Reading::builder(self.node_id, self.cycle)
            .timestamp(self.cycle * 1_000)
            .measurement("temperature_1", 520.0 + wear * 40.0 + self.rng.noise(2.0))
            .measurement("temperature_2", 640.0 + wear * 50.0 + self.rng.noise(3.0))
            .measurement("pressure", 14.5 + wear * 2.0 + self.rng.noise(0.3))
            .measurement("vibration", 0.02 + wear * 0.08 + self.rng.noise(0.005))
            .measurement("rpm", 2300.0 + wear * 200.0 + self.rng.noise(20.0))
            .health((100.0 - wear * 100.0).clamp(0.0, 100.0))
            .build();
        Some(reading)
    }

    /// Every remaining reading
    pub fn drain(&mut self) -> Vec<Reading> {
        std::iter::from_fn(|| self.next_reading()).collect()
    }
}

/// A healthy, steady reading
pub fn nominal(node_id: NodeId, cycle: u64) -> Reading {
    Reading::builder(node_id, cycle)
        .measurement("temperature_1", 540.0)
        .measurement("temperature_2", 670.0)
        .measurement("pressure", 15.0)
        .measurement("vibration", 0.05)
        .measurement("rpm", 2400.0)
        .health(90.0)
        .build()
}

/// The worn reading at cycle 150: two temperatures over threshold, low health
pub fn worn_reading(node_id: NodeId) -> Reading {
    Reading::builder(node_id, 150)
        .measurement("temperature_1", 555.0)
        .measurement("temperature_2", 685.0)
        .measurement("pressure", 15.8)
        .measurement("vibration", 0.075)
        .measurement("rpm", 2420.0)
        .health(25.0)
        .build()
}
