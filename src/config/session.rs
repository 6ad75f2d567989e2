//! Session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session lifetime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds without user activity before a forced sign-out
    pub idle_timeout_seconds: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 30 * 60,
        }
    }
}
