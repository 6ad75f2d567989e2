//! Binds the console session to the browser that authenticated.
//!
//! The session manager tracks a single operator. A successful login issues a
//! random token, handed to the client as an HttpOnly cookie. Requests that do
//! not present the current token see the console as logged out.

use axum::http::{header, HeaderMap, HeaderValue};
use std::sync::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::api::ApiError;
use crate::session::{SessionManager, SessionState};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "kiln_session";

/// Token of the client currently owning the session.
#[derive(Debug, Default)]
pub struct SessionBinding {
    token: RwLock<Option<String>>,
    /// Serializes login-type operations
    gate: Mutex<()>,
}

impl SessionBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token, replacing any previous one
    pub fn issue(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        token
    }

    pub fn revoke(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Whether `presented` is the current token
    pub fn is_bound(&self, presented: Option<&str>) -> bool {
        let current = self.token.read().unwrap_or_else(|e| e.into_inner());
        match (current.as_deref(), presented) {
            (Some(current), Some(presented)) => current == presented,
            _ => false,
        }
    }

    /// Session state as seen by the client sending `headers`
    pub fn view(&self, session: &SessionManager, headers: &HeaderMap) -> SessionState {
        if self.is_bound(session_token(headers)) {
            session.state()
        } else {
            SessionState::LoggedOut
        }
    }

    /// Start a login-type operation for the client sending `headers`.
    ///
    /// Refused while another client holds a session that has not ended.
    /// The returned guard keeps concurrent logins out until it is dropped.
    pub async fn begin(
        &self,
        session: &SessionManager,
        headers: &HeaderMap,
    ) -> Result<MutexGuard<'_, ()>, ApiError> {
        let guard = self.gate.lock().await;
        if session.state() != SessionState::LoggedOut && !self.is_bound(session_token(headers)) {
            return Err(ApiError::conflict(
                "the console is in use by another session",
                "session_in_use",
            ));
        }
        Ok(guard)
    }
}

/// Session token from the request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// `Set-Cookie` value handing `token` to the client
pub fn session_cookie(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict"
    ))
    .ok()
}

/// `Set-Cookie` value removing the token from the client
pub fn cleared_cookie() -> HeaderValue {
    HeaderValue::from_static("kiln_session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}
