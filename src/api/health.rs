//! Health check endpoint handler.

use crate::api::AppState;
use crate::history::PlantStatus;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub plant_status: PlantStatus,
    pub session: &'static str,
    pub history: HistoryCounts,
}

/// Sizes of the bounded history sequences.
#[derive(Debug, Serialize)]
pub struct HistoryCounts {
    pub kpi_samples: usize,
    pub logs: usize,
}

/// GET /health - Return console health status.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.history.snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        plant_status: snapshot.plant_status,
        session: state.session.state().name(),
        history: HistoryCounts {
            kpi_samples: snapshot.spc_history.len(),
            logs: snapshot.logs.len(),
        },
    })
}
