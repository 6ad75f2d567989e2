//! Identity service configuration
//!
//! Accounts listed here are registered with the in-memory identity service
//! at startup, together with their profile documents.

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Identity service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Email/password accounts created at startup
    pub accounts: Vec<SeedAccount>,
    /// Account returned by the external provider sign-in flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderAccount>,
}

/// Email/password account with its profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAccount {
    pub email: String,
    pub password: String,
    pub username: String,
    pub role: Role,
}

/// Identity handed out by the external provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
