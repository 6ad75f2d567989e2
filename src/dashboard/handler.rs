//! HTTP handlers for dashboard routes

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, AppState};
use crate::dashboard::types::{Screen, NAVIGATION};
use crate::history::{Action, LogEntry, LogFilter, PlantStatus};
use crate::session::Role;

/// Embedded dashboard assets from dashboard/ directory
#[derive(RustEmbed)]
#[folder = "dashboard/"]
struct DashboardAssets;

const INITIAL_DATA_SLOT: &str = r#"<script id="initial-data" type="application/json">{}</script>"#;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PlantStatusBody {
    pub status: PlantStatus,
}

/// Routes for `/` and every screen
pub fn screen_routes() -> Router<Arc<AppState>> {
    let mut router = Router::new().route(
        "/",
        get(|| async { Redirect::to(Screen::Dashboard.path()) }),
    );
    for screen in Screen::ALL {
        router = router.route(
            screen.path(),
            get(
                move |State(state): State<Arc<AppState>>, headers: HeaderMap| async move {
                    render_screen(&state, screen, &headers)
                },
            ),
        );
    }
    router
}

/// Serves the console page for `screen` with injected initial data.
///
/// Gated screens redirect to `/login` unless the caller holds the logged-in
/// session, and the login screen redirects that caller to the dashboard.
pub fn render_screen(state: &AppState, screen: Screen, headers: &HeaderMap) -> Response {
    let session = state.binding.view(&state.session, headers);
    if screen.requires_session() && !session.is_logged_in() {
        return Redirect::to(Screen::Login.path()).into_response();
    }
    if screen == Screen::Login && session.is_logged_in() {
        return Redirect::to(Screen::Dashboard.path()).into_response();
    }

    let Some(content) = DashboardAssets::get("index.html") else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Dashboard HTML not found").into_response();
    };
    let html = match std::str::from_utf8(&content.data) {
        Ok(html) => html,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid HTML encoding").into_response()
        }
    };

    let snapshot = state.history.snapshot();
    let initial_data = serde_json::json!({
        "screen": screen,
        "navigation": NAVIGATION,
        "session": session,
        "history": &*snapshot,
        "kpi_cards": snapshot.kpi_cards(),
    });
    let initial_json = initial_data.to_string().replace("</", "<\\/");

    let updated_html = html.replace(
        INITIAL_DATA_SLOT,
        &format!(
            r#"<script id="initial-data" type="application/json">{}</script>"#,
            initial_json
        ),
    );

    Html(updated_html).into_response()
}

/// Serves the current history snapshot
pub async fn history_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.history.snapshot();
    Json(&*snapshot).into_response()
}

/// Serves the plant log, newest first, optionally filtered by level
pub async fn logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let filter: LogFilter = query
        .level
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| ApiError::bad_request(&e))?;
    Ok(Json(state.history.snapshot().logs_matching(filter)))
}

/// Changes the plant status. Managers only.
pub async fn plant_status_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PlantStatusBody>,
) -> Result<Json<PlantStatusBody>, ApiError> {
    let session = state.binding.view(&state.session, &headers);
    if !session.is_logged_in() {
        return Err(ApiError::unauthorized("login required"));
    }
    if session.role() != Some(Role::Manager) {
        return Err(ApiError::forbidden("only managers can change the plant status"));
    }

    tracing::info!(
        status = ?body.status,
        user = session.username().unwrap_or("unknown"),
        "Plant status changed"
    );
    state.history.dispatch(Action::SetPlantStatus(body.status));
    Ok(Json(PlantStatusBody {
        status: state.history.snapshot().plant_status,
    }))
}

/// Serves static assets (CSS, JS, etc.)
pub async fn assets_handler(Path(path): Path<String>) -> Response {
    match DashboardAssets::get(&path) {
        Some(content) => {
            let body = content.data;
            let mime_type = mime_guess::from_path(&path).first_or_octet_stream();

            ([(header::CONTENT_TYPE, mime_type.as_ref())], body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
