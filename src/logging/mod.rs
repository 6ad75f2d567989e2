//! Structured logging helpers
//!
//! Filter directive construction for the tracing subscriber and the request
//! tracking middleware used by the HTTP router.

pub mod middleware;

pub use middleware::{generate_request_id, track_requests};

/// `EnvFilter` directives for the configured levels.
///
/// The base level comes first, then one `kiln::<module>=<level>` directive
/// per entry of `logging.modules`, in module name order.
///
/// ```
/// use kiln::config::LoggingConfig;
/// use kiln::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.modules.insert("session".to_string(), "debug".to_string());
/// assert_eq!(build_filter_directives(&config), "info,kiln::session=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut directives = config.level.clone();
    for (module, level) in &config.modules {
        directives.push_str(&format!(",kiln::{module}={level}"));
    }
    directives
}
