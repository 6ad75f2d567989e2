//! # Console HTTP API
//!
//! Router and shared state for the kiln console server.
//!
//! ## Endpoints
//!
//! - `GET /dashboard`, `/controller`, `/chatbot`, `/optimizer` - Screens (redirect to
//!   `/login` without a session)
//! - `GET /login` - Login screen
//! - `GET /assets/*path` - Embedded static assets
//! - `GET /api/history` - Current history snapshot
//! - `GET /api/logs?level=` - Plant log, optionally filtered by level
//! - `PUT /api/plant-status` - Change the plant status (Manager only)
//! - `GET /api/session` and `POST /api/session/*` - Session operations
//! - `GET /ws` - WebSocket stream of dashboard updates
//! - `GET /health` - Console health
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Example
//!
//! ```no_run
//! use kiln::api::{AppState, create_router};
//! use kiln::config::KilnConfig;
//! use kiln::session::InMemoryIdentityService;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(KilnConfig::default());
//! let identity = Arc::new(InMemoryIdentityService::from_config(&config.identity)?);
//!
//! let state = Arc::new(AppState::new(config, identity));
//! state.session.install_listener()?;
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! JSON endpoints report errors as:
//! ```json
//! {
//!   "error": {
//!     "message": "invalid credentials",
//!     "type": "authentication_error",
//!     "code": "invalid_credentials"
//!   }
//! }
//! ```

pub mod auth;
mod health;
mod session;
pub mod types;

pub use auth::SessionBinding;
pub use types::*;

use crate::config::KilnConfig;
use crate::dashboard::{self, types::DashboardUpdate};
use crate::history::HistoryStore;
use crate::metrics::MetricsCollector;
use crate::session::{IdentityService, SessionManager};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KB).
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<KilnConfig>,
    pub history: Arc<HistoryStore>,
    pub session: Arc<SessionManager>,
    /// Ties the session to the client that logged in
    pub binding: SessionBinding,
    /// Dashboard update stream shared by the history store and session manager
    pub ws_broadcast: broadcast::Sender<DashboardUpdate>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    /// Create application state. The session listener is not installed.
    pub fn new(config: Arc<KilnConfig>, identity: Arc<dyn IdentityService>) -> Self {
        let (ws_broadcast, _) = broadcast::channel(config.server.broadcast_capacity.max(1));
        let start_time = Instant::now();

        let history = Arc::new(HistoryStore::new().with_broadcast(ws_broadcast.clone()));
        let session =
            SessionManager::with_broadcast(identity, &config.session, ws_broadcast.clone());

        // Initialize metrics (safe to call multiple times - will reuse existing if already set)
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            // Already installed (e.g. in tests): build a detached recorder handle
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });

        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&history),
            Arc::clone(&session),
            start_time,
            prometheus_handle,
        ));

        Self {
            config,
            history,
            session,
            binding: SessionBinding::new(),
            ws_broadcast,
            start_time,
            metrics_collector,
        }
    }
}

/// Create the main router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let api = Router::new()
        .route("/history", get(dashboard::history_handler))
        .route("/logs", get(dashboard::logs_handler))
        .route("/plant-status", put(dashboard::plant_status_handler))
        .route("/session", get(session::current))
        .route("/session/signup", post(session::sign_up))
        .route("/session/login", post(session::log_in))
        .route("/session/external", post(session::external))
        .route("/session/role", post(session::select_role))
        .route("/session/logout", post(session::log_out))
        .route("/session/activity", post(session::activity));

    Router::new()
        .merge(dashboard::screen_routes())
        .route("/assets/*path", get(dashboard::assets_handler))
        .nest("/api", api)
        .route("/ws", get(dashboard::websocket_handler))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::from_fn(crate::logging::track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
