//! # Metrics Collection Module
//!
//! Prometheus export of console activity at `GET /metrics`.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `kiln_history_actions_total{action}` - Actions applied to the history store
//! - `kiln_telemetry_dropped_total{reason}` - Rejected telemetry payload parts
//! - `kiln_session_transitions_total{state}` - Session state changes
//! - `kiln_session_expired_total` - Idle expiries
//! - `kiln_http_requests_total{method, status}` - HTTP requests served
//!
//! **Histograms:**
//! - `kiln_http_request_duration_seconds` - HTTP request duration
//!
//! **Gauges:**
//! - `kiln_kpi_value{metric}` - Latest accepted KPI value
//! - `kiln_history_kpi_samples` - Samples held per KPI series
//! - `kiln_history_logs` - Log entries held
//! - `kiln_plant_status{status}` - 1 for the current plant status
//! - `kiln_session_logged_in` - 1 while a user is logged in

pub mod handler;

// Re-export PrometheusBuilder for test compatibility
pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::history::{HistoryStore, PlantStatus};
use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Instant;

/// Computes derived gauges and renders the Prometheus text format.
pub struct MetricsCollector {
    history: Arc<HistoryStore>,
    session: Arc<SessionManager>,
    /// Server startup time for uptime calculation
    start_time: Instant,
    /// Prometheus handle for rendering metrics
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        history: Arc<HistoryStore>,
        session: Arc<SessionManager>,
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            history,
            session,
            start_time,
            prometheus_handle,
        }
    }

    /// Update gauges derived from the history snapshot and session state.
    pub fn update_console_gauges(&self) {
        let snapshot = self.history.snapshot();

        metrics::gauge!("kiln_history_kpi_samples").set(snapshot.spc_history.len() as f64);
        metrics::gauge!("kiln_history_logs").set(snapshot.logs.len() as f64);

        for status in [
            PlantStatus::Running,
            PlantStatus::Stopped,
            PlantStatus::Maintenance,
        ] {
            let value = if snapshot.plant_status == status { 1.0 } else { 0.0 };
            metrics::gauge!("kiln_plant_status", "status" => status.as_str()).set(value);
        }

        let logged_in = if self.session.state().is_logged_in() { 1.0 } else { 0.0 };
        metrics::gauge!("kiln_session_logged_in").set(logged_in);
    }

    /// Get uptime in seconds since server startup.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Initialize the Prometheus exporter with request duration buckets.
///
/// Buckets: [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1, 5] seconds.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::Matcher;

    let duration_buckets = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("kiln_http_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
