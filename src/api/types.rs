//! Error envelope shared by the JSON endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::session::{IdentityError, SessionError};

/// API error response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    fn new(message: &str, r#type: &str, code: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: r#type.to_string(),
                code: Some(code.to_string()),
            },
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: &str) -> Self {
        Self::new(message, "invalid_request_error", "invalid_request_error")
    }

    /// Create an unauthorized error (401).
    pub fn unauthorized(message: &str) -> Self {
        Self::new(message, "authentication_error", "unauthorized")
    }

    /// Create a forbidden error (403).
    pub fn forbidden(message: &str) -> Self {
        Self::new(message, "permission_error", "forbidden")
    }

    /// Create a conflict error (409).
    pub fn conflict(message: &str, code: &str) -> Self {
        Self::new(message, "invalid_request_error", code)
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: &str) -> Self {
        Self::new(message, "server_error", "service_unavailable")
    }

    /// Create an internal error (500).
    pub fn internal(message: &str) -> Self {
        Self::new(message, "server_error", "internal_error")
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("unauthorized") | Some("invalid_credentials") => StatusCode::UNAUTHORIZED,
            Some("forbidden") => StatusCode::FORBIDDEN,
            Some("email_in_use") | Some("no_pending_identity") | Some("session_in_use") => {
                StatusCode::CONFLICT
            }
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::Identity(identity) => match identity {
                IdentityError::EmailInUse(_) => ApiError::conflict(&message, "email_in_use"),
                IdentityError::InvalidEmail(_) | IdentityError::WeakPassword(_) => {
                    ApiError::bad_request(&message)
                }
                IdentityError::InvalidCredentials => {
                    ApiError::new(&message, "authentication_error", "invalid_credentials")
                }
                IdentityError::ProviderUnavailable | IdentityError::Network(_) => {
                    ApiError::service_unavailable(&message)
                }
                IdentityError::Internal(_) => ApiError::internal(&message),
            },
            SessionError::NoPendingIdentity => ApiError::conflict(&message, "no_pending_identity"),
            SessionError::NotSignedIn(_) => ApiError::unauthorized(&message),
            SessionError::ListenerAlreadyInstalled => ApiError::internal(&message),
        }
    }
}
