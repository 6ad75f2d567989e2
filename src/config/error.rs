//! Errors raised while loading or checking `kiln.toml`

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config file at {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid kiln config: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    /// A setting parsed but its value is unusable. `key` is the dotted TOML path.
    #[error("bad setting {key}: {reason}")]
    Setting { key: String, reason: String },
}

impl ConfigError {
    pub fn setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Setting {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Dotted path of the offending setting, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::Setting { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_error_names_the_key() {
        let err = ConfigError::setting("telemetry.interval_ms", "must be at least 1");
        assert_eq!(err.key(), Some("telemetry.interval_ms"));
        assert_eq!(
            err.to_string(),
            "bad setting telemetry.interval_ms: must be at least 1"
        );
    }

    #[test]
    fn test_file_errors_mention_the_path() {
        let missing = ConfigError::Missing(PathBuf::from("/etc/kiln.toml"));
        assert!(missing.to_string().contains("/etc/kiln.toml"));
        assert_eq!(missing.key(), None);

        let syntax = ConfigError::Syntax {
            path: PathBuf::from("kiln.toml"),
            message: "expected `]`".to_string(),
        };
        assert!(syntax.to_string().starts_with("kiln.toml is not a valid kiln config"));
    }
}
