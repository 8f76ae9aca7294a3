//! Detection Parameters
//!
//! Window sizes and rule thresholds for the turbofan-style telemetry the edge
//! nodes monitor. Temperatures are in °F, pressure in psi, vibration in g and
//! rotation in revolutions per minute.

// ===== CHANNEL NAMES =====

/// First temperature probe (°F).
pub const CHANNEL_TEMPERATURE_1: &str = "temperature_1";

/// Second temperature probe (°F).
pub const CHANNEL_TEMPERATURE_2: &str = "temperature_2";

/// Line pressure (psi).
pub const CHANNEL_PRESSURE: &str = "pressure";

/// Housing vibration (g).
pub const CHANNEL_VIBRATION: &str = "vibration";

/// Shaft speed (rpm).
pub const CHANNEL_RPM: &str = "rpm";

/// Pseudo-channel under which the health indicator is windowed.
pub const CHANNEL_HEALTH: &str = "health";

/// Feature order expected by externally trained classifiers.
///
/// The models are fit on vectors in exactly this order. Changing it silently
/// breaks every deployed model, so it is fixed here rather than configured.
pub const FEATURE_CHANNELS: [&str; 5] = [
    CHANNEL_TEMPERATURE_1,
    CHANNEL_TEMPERATURE_2,
    CHANNEL_PRESSURE,
    CHANNEL_VIBRATION,
    CHANNEL_RPM,
];

// ===== WINDOWING =====

/// Default number of samples kept per (node, channel).
///
/// 10 samples × 8 bytes × 6 channels ≈ 480 bytes per node.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Samples averaged for the rapid-change baseline.
///
/// Deliberately smaller than the window: only the last five samples form the
/// baseline even though ten are retained.
pub const RAPID_CHANGE_SAMPLES: usize = 5;

/// Percentage deviation from the baseline that counts as rapid change.
pub const RAPID_CHANGE_PCT: f64 = 15.0;

// ===== HEALTH =====

/// Health indicator below which a node is flagged (%).
pub const HEALTH_THRESHOLD_PCT: f64 = 30.0;

/// Health indicator below which the flag is critical (%).
pub const HEALTH_CRITICAL_PCT: f64 = 20.0;

/// Valid range of the health indicator (%).
pub const HEALTH_MIN_PCT: f64 = 0.0;

/// Valid range of the health indicator (%).
pub const HEALTH_MAX_PCT: f64 = 100.0;

// ===== DEFAULT THRESHOLDS =====

/// Alarm level for the first temperature probe (°F).
pub const TEMPERATURE_1_THRESHOLD_F: f64 = 550.0;

/// Alarm level for the second temperature probe (°F).
pub const TEMPERATURE_2_THRESHOLD_F: f64 = 680.0;

/// Alarm level for line pressure (psi).
pub const PRESSURE_THRESHOLD_PSI: f64 = 16.0;

/// Alarm level for housing vibration (g).
pub const VIBRATION_THRESHOLD_G: f64 = 0.08;

/// Alarm level for shaft speed (rpm).
pub const RPM_THRESHOLD: f64 = 2450.0;
