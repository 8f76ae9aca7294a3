//! Rule-Based Anomaly Detection
//!
//! ## Overview
//!
//! Three independent checks run over every reading:
//!
//! | Check        | Condition                                   | Severity            |
//! |--------------|---------------------------------------------|---------------------|
//! | Threshold    | `value > threshold[channel]`                | Warning             |
//! | Health       | `health < health_threshold`                 | Critical below 20%, else Warning |
//! | Rapid change | `|value − avg₅| / avg₅ × 100 > 15`          | Warning             |
//!
//! The checks are not mutually exclusive: one channel can trip both its
//! threshold and the rapid-change check in the same reading.
//!
//! ## Rapid Change
//!
//! The baseline is the mean of the last `rapid_change_samples` (5) values of
//! the channel, taken from the node's window *after* the current reading has
//! been appended. Until the window holds that many samples the check is
//! skipped for that channel (`InsufficientData` is expected during warm-up,
//! not an error). A non-positive baseline is also skipped: percentage change
//! against zero is undefined.
//!
//! ## Determinism
//!
//! The detector is a pure function of the reading, the history snapshot and
//! the rule set. Channels are visited in the fixed order defined by
//! [`Reading::channels`], so the emitted anomaly list is identical for
//! identical inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, Severity};
use crate::constants::detection::{
    CHANNEL_PRESSURE, CHANNEL_RPM, CHANNEL_TEMPERATURE_1, CHANNEL_TEMPERATURE_2,
    CHANNEL_VIBRATION, HEALTH_CRITICAL_PCT, HEALTH_THRESHOLD_PCT, PRESSURE_THRESHOLD_PSI,
    RAPID_CHANGE_PCT, RAPID_CHANGE_SAMPLES, RPM_THRESHOLD, TEMPERATURE_1_THRESHOLD_F,
    TEMPERATURE_2_THRESHOLD_F, VIBRATION_THRESHOLD_G,
};
use crate::history::WindowedHistory;
use crate::reading::Reading;

/// Threshold and trend parameters for rule detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Channel → alarm level (strictly greater fires)
    pub thresholds: BTreeMap<String, f64>,
    /// Health below this is flagged
    pub health_threshold: f64,
    /// Health below this is critical
    pub health_critical: f64,
    /// Samples averaged for the rapid-change baseline
    pub rapid_change_samples: usize,
    /// Percentage deviation that counts as rapid change
    pub rapid_change_pct: f64,
}

impl Default for RuleSet {
    fn default() -> Self {
        let thresholds = [
            (CHANNEL_TEMPERATURE_1, TEMPERATURE_1_THRESHOLD_F),
            (CHANNEL_TEMPERATURE_2, TEMPERATURE_2_THRESHOLD_F),
            (CHANNEL_PRESSURE, PRESSURE_THRESHOLD_PSI),
            (CHANNEL_VIBRATION, VIBRATION_THRESHOLD_G),
            (CHANNEL_RPM, RPM_THRESHOLD),
        ]
        .into_iter()
        .map(|(channel, level)| (channel.to_string(), level))
        .collect();

        Self {
            thresholds,
            health_threshold: HEALTH_THRESHOLD_PCT,
            health_critical: HEALTH_CRITICAL_PCT,
            rapid_change_samples: RAPID_CHANGE_SAMPLES,
            rapid_change_pct: RAPID_CHANGE_PCT,
        }
    }
}

impl RuleSet {
    /// Rule set with no channel thresholds (health and trend checks only)
    pub fn without_thresholds() -> Self {
        Self {
            thresholds: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Set or replace the threshold of one channel
    pub fn with_threshold(mut self, channel: &str, level: f64) -> Self {
        self.thresholds.insert(channel.to_string(), level);
        self
    }

    /// Set the health levels
    pub fn with_health(mut self, threshold: f64, critical: f64) -> Self {
        self.health_threshold = threshold;
        self.health_critical = critical;
        self
    }

    /// Set the rapid-change parameters
    pub fn with_rapid_change(mut self, samples: usize, pct: f64) -> Self {
        self.rapid_change_samples = samples;
        self.rapid_change_pct = pct;
        self
    }
}

/// Threshold, health and rapid-change detector
#[derive(Debug, Clone, Default)]
pub struct RuleAnomalyDetector {
    rules: RuleSet,
}

impl RuleAnomalyDetector {
    /// Create a detector for a rule set
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Active rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run every check, in order: thresholds, health, rapid change
    pub fn detect(&self, reading: &Reading, history: &WindowedHistory) -> Vec<Anomaly> {
        let mut anomalies = self.check_thresholds(reading);
        anomalies.extend(self.check_health(reading));
        anomalies.extend(self.check_rapid_change(reading, history));
        anomalies
    }

    /// Channels above their configured threshold
    pub fn check_thresholds(&self, reading: &Reading) -> Vec<Anomaly> {
        reading
            .channels()
            .filter_map(|(channel, value)| {
                let threshold = *self.rules.thresholds.get(channel)?;
                (value > threshold).then(|| Anomaly::threshold_exceeded(channel, value, threshold))
            })
            .collect()
    }

    /// Health indicator below the configured threshold
    pub fn check_health(&self, reading: &Reading) -> Option<Anomaly> {
        if reading.health >= self.rules.health_threshold {
            return None;
        }

        let severity = if reading.health < self.rules.health_critical {
            Severity::Critical
        } else {
            Severity::Warning
        };

        Some(Anomaly::low_health(reading.health, self.rules.health_threshold, severity))
    }

    /// Channels deviating sharply from their recent mean
    pub fn check_rapid_change(&self, reading: &Reading, history: &WindowedHistory) -> Vec<Anomaly> {
        let samples = self.rules.rapid_change_samples;

        reading
            .channels()
            .filter_map(|(channel, value)| {
                // Warm-up: fewer than `samples` values yet
                let avg = history.mean_of_recent(reading.node_id, channel, samples).ok()?;

                // Percentage change against a zero or negative baseline is meaningless
                if avg <= 0.0 {
                    return None;
                }

                let change_pct = ((value - avg) / avg).abs() * 100.0;
                (change_pct > self.rules.rapid_change_pct)
                    .then(|| Anomaly::rapid_change(channel, value, avg, change_pct))
            })
            .collect()
    }
}
