//! Session endpoints.
//!
//! Login style operations only start a transition; the handlers wait a
//! bounded time for the auth listener to settle the state before replying.
//! Logins hand out the session cookie; the other operations require it.

use crate::api::{auth, ApiError, AppState};
use crate::session::{ActivitySignal, Identity, Role, SessionState};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How long a handler waits for the listener after a successful call
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    pub signal: ActivitySignal,
}

/// Response of the external provider flow
#[derive(Debug, Serialize)]
pub struct ExternalSignInResponse {
    /// Present when a role must still be selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_identity: Option<Identity>,
    pub session: SessionState,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub reset: bool,
}

fn settled(state: &SessionState) -> bool {
    !matches!(state, SessionState::Authenticating)
}

/// Attach the session cookie for a freshly issued token
fn with_session_cookie(state: &AppState, body: impl IntoResponse) -> Response {
    let token = state.binding.issue();
    let mut response = body.into_response();
    match auth::session_cookie(&token) {
        Some(cookie) => {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        None => tracing::error!("Session token is not a valid cookie value"),
    }
    response
}

/// GET /api/session
pub async fn current(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<SessionState> {
    Json(state.binding.view(&state.session, &headers))
}

/// POST /api/session/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::bad_request("username cannot be empty"));
    }
    let _gate = state.binding.begin(&state.session, &headers).await?;
    let result = state
        .session
        .sign_up(&req.email, &req.password, req.username.trim(), req.role)
        .await;
    if state.session.state() == SessionState::LoggedOut {
        state.binding.revoke();
    }
    result?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, auth::cleared_cookie())],
        Json(state.session.state()),
    ))
}

/// POST /api/session/login
pub async fn log_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let _gate = state.binding.begin(&state.session, &headers).await?;
    state.session.log_in(&req.email, &req.password).await?;
    let session = state.session.settle(SETTLE_TIMEOUT, settled).await;
    Ok(with_session_cookie(&state, Json(session)))
}

/// POST /api/session/external
pub async fn external(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let _gate = state.binding.begin(&state.session, &headers).await?;
    let pending_identity = state.session.sign_in_with_external_provider().await?;
    let session = match &pending_identity {
        Some(_) => state.session.state(),
        None => state.session.settle(SETTLE_TIMEOUT, settled).await,
    };
    Ok(with_session_cookie(
        &state,
        Json(ExternalSignInResponse {
            pending_identity,
            session,
        }),
    ))
}

/// POST /api/session/role
pub async fn select_role(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RoleRequest>,
) -> Result<Json<SessionState>, ApiError> {
    if !state.binding.is_bound(auth::session_token(&headers)) {
        return Err(ApiError::unauthorized("sign in before choosing a role"));
    }
    let session = state.session.select_role(req.role).await?;
    Ok(Json(session))
}

/// POST /api/session/logout
pub async fn log_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if !state.binding.is_bound(auth::session_token(&headers)) {
        return Err(ApiError::unauthorized("no session to log out"));
    }
    state.session.log_out().await?;
    let session = state
        .session
        .settle(SETTLE_TIMEOUT, |s| *s == SessionState::LoggedOut)
        .await;
    state.binding.revoke();
    Ok(([(header::SET_COOKIE, auth::cleared_cookie())], Json(session)))
}

/// POST /api/session/activity
pub async fn activity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ActivityRequest>,
) -> Json<ActivityResponse> {
    let reset = state.binding.is_bound(auth::session_token(&headers))
        && state.session.record_activity(req.signal);
    Json(ActivityResponse { reset })
}
