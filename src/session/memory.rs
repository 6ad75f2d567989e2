//! In-process identity service backed by concurrent maps.

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use dashmap::DashMap;
use rand_core::OsRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;

use super::error::IdentityError;
use super::identity::{AuthEvent, IdentityService};
use super::types::{Identity, ProfileDocument, USERS_COLLECTION};
use crate::config::{IdentityConfig, SeedAccount};

/// Minimum password length accepted by `create_identity`
pub const MIN_PASSWORD_LEN: usize = 6;

const EVENT_CAPACITY: usize = 64;

struct Account {
    identity: Identity,
    password_hash: String,
}

/// Identity service used by the console server and tests.
///
/// Passwords are stored as argon2 hashes. A single identity can be signed in
/// at a time, mirroring a single browser session.
pub struct InMemoryIdentityService {
    /// Keyed by lowercased email
    accounts: DashMap<String, Account>,
    documents: DashMap<(String, String), serde_json::Value>,
    provider: Option<Identity>,
    current: RwLock<Option<Identity>>,
    events: broadcast::Sender<AuthEvent>,
    available: AtomicBool,
}

impl InMemoryIdentityService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: DashMap::new(),
            documents: DashMap::new(),
            provider: None,
            current: RwLock::new(None),
            events,
            available: AtomicBool::new(true),
        }
    }

    /// Build a service seeded with the configured accounts and provider
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let mut service = Self::new();
        if let Some(provider) = &config.provider {
            service = service.with_provider_account(&provider.email, provider.display_name.clone());
        }
        for account in &config.accounts {
            service.seed_account(account)?;
        }
        Ok(service)
    }

    /// Configure the account returned by the external provider flow
    pub fn with_provider_account(mut self, email: &str, display_name: Option<String>) -> Self {
        self.provider = Some(Identity {
            uid: new_uid(),
            email: Some(email.to_string()),
            display_name,
        });
        self
    }

    /// Register an account and its profile without signing it in
    pub fn seed_account(&self, account: &SeedAccount) -> Result<Identity, IdentityError> {
        let identity = self.register(&account.email, &account.password)?;
        let profile = ProfileDocument {
            username: account.username.clone(),
            role: account.role,
            email: account.email.clone(),
        };
        self.documents.insert(
            (USERS_COLLECTION.to_string(), identity.uid.clone()),
            profile.to_value(),
        );
        tracing::debug!(email = %account.email, role = %account.role, "Seeded account");
        Ok(identity)
    }

    /// Simulate losing (or regaining) connectivity to the hosted service
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn ensure_available(&self) -> Result<(), IdentityError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(IdentityError::Network(
                "identity service is offline".to_string(),
            ))
        }
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(IdentityError::InvalidEmail(email.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let key = email.to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(IdentityError::EmailInUse(email.to_string()));
        }

        let identity = Identity {
            uid: new_uid(),
            email: Some(email.to_string()),
            display_name: None,
        };
        let password_hash = hash_password(password)?;

        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(IdentityError::EmailInUse(email.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Account {
                    identity: identity.clone(),
                    password_hash,
                });
                Ok(identity)
            }
        }
    }

    fn sign_in(&self, identity: Identity) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(identity.clone());
        drop(current);
        let _ = self.events.send(AuthEvent::SignedIn(identity));
    }
}

impl Default for InMemoryIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentityService {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        self.ensure_available()?;
        let identity = self.register(email, password)?;
        tracing::info!(uid = %identity.uid, "Created identity");
        self.sign_in(identity.clone());
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.ensure_available()?;
        let identity = {
            let account = self
                .accounts
                .get(&email.trim().to_lowercase())
                .ok_or(IdentityError::InvalidCredentials)?;
            if !verify_password(&account.password_hash, password)? {
                return Err(IdentityError::InvalidCredentials);
            }
            account.identity.clone()
        };
        self.sign_in(identity.clone());
        Ok(identity)
    }

    async fn authenticate_with_provider(&self) -> Result<Identity, IdentityError> {
        self.ensure_available()?;
        let identity = self
            .provider
            .clone()
            .ok_or(IdentityError::ProviderUnavailable)?;
        self.sign_in(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if previous.is_some() {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn read_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, IdentityError> {
        self.ensure_available()?;
        Ok(self
            .documents
            .get(&(collection.to_string(), key.to_string()))
            .map(|doc| doc.value().clone()))
    }

    async fn write_document(
        &self,
        collection: &str,
        key: &str,
        fields: serde_json::Value,
    ) -> Result<(), IdentityError> {
        self.ensure_available()?;
        self.documents
            .insert((collection.to_string(), key.to_string()), fields);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn new_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal(e.to_string()))
}

fn verify_password(stored_hash: &str, password: &str) -> Result<bool, IdentityError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| IdentityError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
