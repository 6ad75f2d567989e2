//! `[logging]` section

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Levels accepted by the tracing filter
const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line output for a terminal
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(ConfigError::setting(
                "logging.format",
                format!("`{s}` is neither pretty nor json"),
            ))
        }
    }
}

/// Console log output.
///
/// `modules` raises or lowers the level of single console modules, keyed by
/// module name (`session`, `telemetry`, `history`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Reject level names the tracing filter would not understand
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_level(&self.level) {
            return Err(ConfigError::setting(
                "logging.level",
                format!("unknown level `{}`", self.level),
            ));
        }
        for (module, level) in &self.modules {
            if !is_level(level) {
                return Err(ConfigError::setting(
                    format!("logging.modules.{module}"),
                    format!("unknown level `{level}`"),
                ));
            }
        }
        Ok(())
    }
}

fn is_level(level: &str) -> bool {
    LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level))
}
