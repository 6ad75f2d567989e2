//! Configuration module for the kiln console
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`KILN_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use kiln::config::KilnConfig;
//!
//! // Load defaults
//! let config = KilnConfig::default();
//! assert_eq!(config.server.port, 8000);
//!
//! // Parse from TOML
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: KilnConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```

pub mod error;
pub mod identity;
pub mod logging;
pub mod server;
pub mod session;
pub mod telemetry;

pub use error::ConfigError;
pub use identity::{IdentityConfig, ProviderAccount, SeedAccount};
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use session::SessionConfig;
pub use telemetry::TelemetryConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the console server.
///
/// # Example
///
/// ```rust
/// use kiln::config::KilnConfig;
///
/// let config = KilnConfig::default();
/// assert_eq!(config.server.port, 8000);
/// assert_eq!(config.session.idle_timeout_seconds, 1800);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KilnConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Telemetry feed settings
    pub telemetry: TelemetryConfig,
    /// Session lifetime settings
    pub session: SessionConfig,
    /// Accounts known to the identity service
    pub identity: IdentityConfig,
}

impl KilnConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns `ConfigError::Missing`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::Missing(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Syntax {
                    path: p.to_path_buf(),
                    message: e.message().to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports KILN_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Server settings
        if let Ok(port) = std::env::var("KILN_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("KILN_HOST") {
            self.server.host = host;
        }

        // Logging settings
        if let Ok(level) = std::env::var("KILN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("KILN_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        // Telemetry and session
        if let Ok(telemetry) = std::env::var("KILN_TELEMETRY") {
            self.telemetry.enabled = telemetry.to_lowercase() == "true";
        }
        if let Ok(interval) = std::env::var("KILN_TELEMETRY_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.telemetry.interval_ms = ms;
            }
        }
        if let Ok(timeout) = std::env::var("KILN_IDLE_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.session.idle_timeout_seconds = secs;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;

        if self.server.port == 0 {
            return Err(ConfigError::setting("server.port", "port must be non-zero"));
        }

        if self.server.broadcast_capacity == 0 {
            return Err(ConfigError::setting(
                "server.broadcast_capacity",
                "capacity must be non-zero",
            ));
        }

        if self.telemetry.interval_ms == 0 {
            return Err(ConfigError::setting("telemetry.interval_ms", "interval must be non-zero"));
        }

        if self.session.idle_timeout_seconds == 0 {
            return Err(ConfigError::setting(
                "session.idle_timeout_seconds",
                "idle timeout must be non-zero",
            ));
        }

        for (i, account) in self.identity.accounts.iter().enumerate() {
            if !account.email.contains('@') {
                return Err(ConfigError::setting(
                    format!("identity.accounts[{}].email", i),
                    "not an email address",
                ));
            }
            if account.username.is_empty() {
                return Err(ConfigError::setting(
                    format!("identity.accounts[{}].username", i),
                    "username cannot be empty",
                ));
            }
        }

        if let Some(provider) = &self.identity.provider {
            if !provider.email.contains('@') {
                return Err(ConfigError::setting("identity.provider.email", "not an email address"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use std::path::Path;

    #[test]
    fn test_kiln_config_defaults() {
        let config = KilnConfig::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.telemetry.enabled);
        assert_eq!(config.session.idle_timeout_seconds, 1800);
        assert!(config.identity.accounts.is_empty());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [server]
        port = 9000
        "#;

        let config: KilnConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0"); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../kiln.example.toml");
        let config: KilnConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = KilnConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = KilnConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server\nport = ").unwrap();

        let result = KilnConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Syntax { .. })));
    }

    // Env-var tests share process state, so they run as one test.
    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("KILN_PORT", "9999");
        std::env::set_var("KILN_HOST", "127.0.0.1");
        std::env::set_var("KILN_LOG_LEVEL", "debug");
        std::env::set_var("KILN_LOG_FORMAT", "json");
        std::env::set_var("KILN_TELEMETRY", "false");
        std::env::set_var("KILN_IDLE_TIMEOUT", "60");
        let config = KilnConfig::default().with_env_overrides();
        for key in [
            "KILN_PORT",
            "KILN_HOST",
            "KILN_LOG_LEVEL",
            "KILN_LOG_FORMAT",
            "KILN_TELEMETRY",
            "KILN_IDLE_TIMEOUT",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.session.idle_timeout_seconds, 60);

        // Invalid values keep defaults
        std::env::set_var("KILN_PORT", "not-a-number");
        std::env::set_var("KILN_LOG_FORMAT", "xml");
        let config = KilnConfig::default().with_env_overrides();
        std::env::remove_var("KILN_PORT");
        std::env::remove_var("KILN_LOG_FORMAT");

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = KilnConfig::default();
        config.server.port = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Setting { ref key, .. }) if key == "server.port"
        ));
    }

    #[test]
    fn test_config_validation_unknown_log_level() {
        let mut config = KilnConfig::default();
        config.logging.level = "chatty".to_string();

        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("logging.level"));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = KilnConfig::default();
        config.telemetry.interval_ms = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Setting { ref key, .. }) if key == "telemetry.interval_ms"
        ));
    }

    #[test]
    fn test_config_validation_zero_idle_timeout() {
        let mut config = KilnConfig::default();
        config.session.idle_timeout_seconds = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Setting { ref key, .. }) if key.starts_with("session")
        ));
    }

    #[test]
    fn test_config_validation_bad_account_email() {
        let mut config = KilnConfig::default();
        config.identity.accounts.push(SeedAccount {
            email: "not-an-email".to_string(),
            password: "secret123".to_string(),
            username: "op".to_string(),
            role: Role::Operator,
        });

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Setting { ref key, .. }) if key.contains("email")
        ));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = KilnConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
