//! Session data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document collection holding user profiles
pub const USERS_COLLECTION: &str = "users";

/// Console role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Manager,
    Operator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Manager => f.write_str("Manager"),
            Role::Operator => f.write_str("Operator"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "operator" => Ok(Role::Operator),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Handle for an identity known to the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique id, used as the profile document key
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Username used when a profile is created from the identity alone
    pub fn default_username(&self) -> String {
        self.display_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.uid.clone())
    }
}

/// Profile document stored under `users/<uid>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl ProfileDocument {
    /// Parse a raw document; `None` for missing or malformed fields
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "role": self.role,
            "email": self.email,
        })
    }
}

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    LoggedOut,
    Authenticating,
    /// Signed in through the external provider, no profile yet
    AwaitingRoleSelection { identity: Identity },
    /// `username`/`role` are `None` while the profile is unknown
    LoggedIn {
        identity: Identity,
        username: Option<String>,
        role: Option<Role>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::LoggedOut => "logged_out",
            SessionState::Authenticating => "authenticating",
            SessionState::AwaitingRoleSelection { .. } => "awaiting_role_selection",
            SessionState::LoggedIn { .. } => "logged_in",
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::AwaitingRoleSelection { identity }
            | SessionState::LoggedIn { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            SessionState::LoggedIn { username, .. } => username.as_deref(),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::LoggedIn { role, .. } => *role,
            _ => None,
        }
    }
}

/// User interaction that counts as activity for the idle timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Click,
}

/// User-facing notice published by the session manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionNotice {
    Expired { message: String },
}

impl SessionNotice {
    pub fn expired() -> Self {
        SessionNotice::Expired {
            message: "Your session has expired due to inactivity. Please log in again."
                .to_string(),
        }
    }
}
