//! Identity/document service boundary

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::error::IdentityError;
use super::types::Identity;

/// Change in the identity service's signed-in identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Hosted identity and per-user document storage.
///
/// Implementations publish an [`AuthEvent`] whenever the signed-in identity
/// changes, including as a side effect of `create_identity`.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create an email/password identity and sign it in
    async fn create_identity(&self, email: &str, password: &str)
        -> Result<Identity, IdentityError>;

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Sign in through the third-party provider flow
    async fn authenticate_with_provider(&self) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    async fn read_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, IdentityError>;

    async fn write_document(
        &self,
        collection: &str,
        key: &str,
        fields: serde_json::Value,
    ) -> Result<(), IdentityError>;

    /// Stream of auth-state changes
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Currently signed-in identity, if any
    fn current_identity(&self) -> Option<Identity>;
}
