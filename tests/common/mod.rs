//! Shared test utilities for kiln integration tests.
//!
//! Provides app state builders with seeded accounts and small helpers for
//! driving the router with JSON requests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use kiln::api::{create_router, AppState};
use kiln::config::{KilnConfig, SeedAccount};
use kiln::session::{IdentityService, InMemoryIdentityService, Role};
use std::sync::Arc;
use tower::Service;

pub const MANAGER_EMAIL: &str = "manager@kiln.ai";
pub const OPERATOR_EMAIL: &str = "operator@kiln.ai";
pub const PROVIDER_EMAIL: &str = "engineer@kiln.ai";
pub const PASSWORD: &str = "furnace-123";

/// Identity service with a manager, an operator and a provider account.
pub fn seeded_identity() -> InMemoryIdentityService {
    let identity = InMemoryIdentityService::new()
        .with_provider_account(PROVIDER_EMAIL, Some("Process Engineer".to_string()));
    for (email, username, role) in [
        (MANAGER_EMAIL, "Plant Manager", Role::Manager),
        (OPERATOR_EMAIL, "Shift Operator", Role::Operator),
    ] {
        identity
            .seed_account(&SeedAccount {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                username: username.to_string(),
                role,
            })
            .unwrap();
    }
    identity
}

/// App state with default config and no accounts. No listener installed.
pub fn create_test_state() -> Arc<AppState> {
    let config = Arc::new(KilnConfig::default());
    Arc::new(AppState::new(config, Arc::new(InMemoryIdentityService::new())))
}

/// App state with seeded accounts and the auth listener running.
pub fn create_seeded_state() -> Arc<AppState> {
    let config = Arc::new(KilnConfig::default());
    let identity: Arc<dyn IdentityService> = Arc::new(seeded_identity());
    let state = Arc::new(AppState::new(config, identity));
    state.session.install_listener().unwrap();
    state
}

pub fn router(state: &Arc<AppState>) -> Router {
    create_router(Arc::clone(state))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    json_request(Method::POST, uri, body)
}

pub async fn send(app: &mut Router, request: Request<Body>) -> Response<Body> {
    app.call(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// `name=value` part of the session cookie set by `response`
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("kiln_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

/// Log in through the API. Returns the settled session JSON and the
/// session cookie to send with later requests.
pub async fn log_in(app: &mut Router, email: &str) -> (serde_json::Value, String) {
    let response = send(
        app,
        post_json(
            "/api/session/login",
            serde_json::json!({ "email": email, "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);
    let cookie = session_cookie(&response).expect("login sets the session cookie");
    (body_json(response).await, cookie)
}

/// Pull the JSON injected into a rendered screen
pub fn initial_data(html: &str) -> serde_json::Value {
    let start_tag = r#"<script id="initial-data" type="application/json">"#;
    let start = html.find(start_tag).unwrap() + start_tag.len();
    let end = start + html[start..].find("</script>").unwrap();
    serde_json::from_str(&html[start..end].replace("<\\/", "</")).unwrap()
}
