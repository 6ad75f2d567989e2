//! Telemetry feed configuration

use serde::{Deserialize, Serialize};

/// Settings for the synthetic telemetry feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Whether the feed runs at all
    pub enabled: bool,
    /// Milliseconds between ticks
    pub interval_ms: u64,
    /// Fixed RNG seed for reproducible runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 2000,
            seed: None,
        }
    }
}
