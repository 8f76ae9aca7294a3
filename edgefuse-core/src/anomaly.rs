//! Anomaly records produced by detection and fusion
//!
//! Anomalies are ephemeral: they live for one decision cycle, travel to the
//! cloud inside a forwarded event and are otherwise only logged.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal urgency of an anomaly (`Info < Warning < Critical`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Worth recording, no action needed
    Info,
    /// Needs attention
    Warning,
    /// Needs immediate intervention
    Critical,
}

impl Severity {
    /// Upper-case label used on the wire and in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of check produced an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Channel value above its configured threshold
    ThresholdExceeded,
    /// Channel value far from its recent moving average
    RapidChange,
    /// Health indicator below the health threshold
    LowHealth,
    /// External classifier judged the reading anomalous
    ClassifierFlag,
}

impl AnomalyKind {
    /// Snake-case label used on the wire and in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::ThresholdExceeded => "threshold_exceeded",
            AnomalyKind::RapidChange => "rapid_change",
            AnomalyKind::LowHealth => "low_health",
            AnomalyKind::ClassifierFlag => "classifier_flag",
        }
    }
}

/// One finding for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Which check fired
    pub kind: AnomalyKind,
    /// Channel the finding refers to, if any
    pub channel: Option<String>,
    /// Value that triggered the finding
    pub observed_value: f64,
    /// Threshold, moving average or confidence cut-off it was compared to
    pub reference_value: f64,
    /// Resolved urgency
    pub severity: Severity,
    /// Human-readable summary; informational only
    pub explanation: String,
}

impl Anomaly {
    /// Channel value above its threshold
    pub fn threshold_exceeded(channel: &str, value: f64, threshold: f64) -> Self {
        Self {
            kind: AnomalyKind::ThresholdExceeded,
            channel: Some(channel.to_string()),
            observed_value: value,
            reference_value: threshold,
            severity: Severity::Warning,
            explanation: format!("{} exceeded threshold: {:.2} > {}", channel, value, threshold),
        }
    }

    /// Health below the configured threshold
    pub fn low_health(health: f64, threshold: f64, severity: Severity) -> Self {
        Self {
            kind: AnomalyKind::LowHealth,
            channel: Some(crate::constants::CHANNEL_HEALTH.to_string()),
            observed_value: health,
            reference_value: threshold,
            severity,
            explanation: format!("low health level: {:.1}%", health),
        }
    }

    /// Channel value deviating from its moving average
    pub fn rapid_change(channel: &str, value: f64, average: f64, change_pct: f64) -> Self {
        Self {
            kind: AnomalyKind::RapidChange,
            channel: Some(channel.to_string()),
            observed_value: value,
            reference_value: average,
            severity: Severity::Warning,
            explanation: format!("{} rapid change: {:.1}%", channel, change_pct),
        }
    }

    /// Reading flagged by the classifier
    pub fn classifier_flag(confidence: f64, critical_confidence: f64, severity: Severity) -> Self {
        Self {
            kind: AnomalyKind::ClassifierFlag,
            channel: None,
            observed_value: confidence,
            reference_value: critical_confidence,
            severity,
            explanation: format!("classifier flagged pattern (confidence {:.2})", confidence),
        }
    }

    /// Whether the channel belongs to a temperature-class sensor
    pub fn is_temperature(&self) -> bool {
        self.channel
            .as_deref()
            .map_or(false, |channel| channel.contains("temperature"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(
            [Severity::Warning, Severity::Critical, Severity::Info].iter().max(),
            Some(&Severity::Critical)
        );
    }

    #[test]
    fn wire_labels() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");

        let json = serde_json::to_string(&AnomalyKind::RapidChange).unwrap();
        assert_eq!(json, "\"rapid_change\"");
        assert_eq!(AnomalyKind::RapidChange.as_str(), "rapid_change");
    }

    #[test]
    fn temperature_channels() {
        assert!(Anomaly::threshold_exceeded("temperature_2", 700.0, 680.0).is_temperature());
        assert!(!Anomaly::threshold_exceeded("rpm", 2500.0, 2450.0).is_temperature());
        assert!(!Anomaly::classifier_flag(0.9, 0.8, Severity::Critical).is_temperature());
    }

    #[test]
    fn explanation_mentions_channel() {
        let anomaly = Anomaly::threshold_exceeded("temperature_1", 555.0, 550.0);
        assert_eq!(anomaly.explanation, "temperature_1 exceeded threshold: 555.00 > 550");
    }
}
