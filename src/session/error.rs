//! Error types for the session manager and identity service.

use thiserror::Error;

/// Errors reported by an identity/document service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("external identity provider unavailable")]
    ProviderUnavailable,

    #[error("identity service unreachable: {0}")]
    Network(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("auth state listener already installed")]
    ListenerAlreadyInstalled,

    #[error("no identity is awaiting role selection")]
    NoPendingIdentity,

    #[error("identity {0} is not signed in")]
    NotSignedIn(String),
}
