//! Session management
//!
//! Tracks who is signed in to the console, resolves their profile from the
//! identity service's document store, and expires idle sessions.
//!
//! The auth listener installed by [`SessionManager::install_listener`] is the
//! single place that reacts to identity changes. Operations such as
//! [`SessionManager::log_in`] only start the transition; the listener then
//! resolves the final state.

mod error;
mod idle;
mod identity;
mod memory;
mod types;


pub use error::{IdentityError, SessionError};
pub use idle::IdleTimer;
pub use identity::{AuthEvent, IdentityService};
pub use memory::{InMemoryIdentityService, MIN_PASSWORD_LEN};
pub use types::{
    ActivitySignal, Identity, ProfileDocument, Role, SessionNotice, SessionState,
    USERS_COLLECTION,
};

use crate::config::SessionConfig;
use crate::dashboard::types::DashboardUpdate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const NOTICE_CAPACITY: usize = 16;

/// Owns the console's session state.
pub struct SessionManager {
    identity: Arc<dyn IdentityService>,
    state: watch::Sender<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    updates: Option<broadcast::Sender<DashboardUpdate>>,
    idle_timeout: Duration,
    idle: Mutex<Option<IdleTimer>>,
    listener_installed: AtomicBool,
    shutdown: CancellationToken,
    this: Weak<SessionManager>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityService>, config: &SessionConfig) -> Arc<Self> {
        Self::build(identity, config, None)
    }

    /// Also forward expiry notices to dashboard subscribers
    pub fn with_broadcast(
        identity: Arc<dyn IdentityService>,
        config: &SessionConfig,
        updates: broadcast::Sender<DashboardUpdate>,
    ) -> Arc<Self> {
        Self::build(identity, config, Some(updates))
    }

    fn build(
        identity: Arc<dyn IdentityService>,
        config: &SessionConfig,
        updates: Option<broadcast::Sender<DashboardUpdate>>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::LoggedOut);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Arc::new_cyclic(|this| Self {
            identity,
            state,
            notices,
            updates,
            idle_timeout: config.idle_timeout(),
            idle: Mutex::new(None),
            listener_installed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            this: this.clone(),
        })
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Wait up to `timeout` for a state matching `pred` and return the
    /// state at that point, matching or not.
    pub async fn settle<F>(&self, timeout: Duration, pred: F) -> SessionState
    where
        F: Fn(&SessionState) -> bool + Send + Sync,
    {
        let mut rx = self.state.subscribe();
        if tokio::time::timeout(timeout, rx.wait_for(|s| pred(s)))
            .await
            .is_err()
        {
            tracing::debug!("Session did not settle within {:?}", timeout);
        }
        self.state()
    }

    /// Start reacting to identity changes. Can only be installed once.
    pub fn install_listener(&self) -> Result<JoinHandle<()>, SessionError> {
        if self.listener_installed.swap(true, Ordering::SeqCst) {
            return Err(SessionError::ListenerAlreadyInstalled);
        }

        let mut events = self.identity.subscribe();
        let this = self.this.clone();
        let cancel = self.shutdown.clone();

        Ok(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                let Some(manager) = this.upgrade() else {
                    break;
                };

                match event {
                    Ok(AuthEvent::SignedIn(identity)) => manager.resolve_identity(identity).await,
                    Ok(AuthEvent::SignedOut) => {
                        manager.update_state(|_| Some(SessionState::LoggedOut));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth listener lagged, resyncing");
                        match manager.identity.current_identity() {
                            Some(identity) => manager.resolve_identity(identity).await,
                            None => manager.update_state(|_| Some(SessionState::LoggedOut)),
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Auth listener stopped");
        }))
    }

    /// Create an account with its profile, then sign out again.
    ///
    /// The user is expected to log in explicitly afterwards.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> Result<(), SessionError> {
        let previous = self.begin_authenticating();

        let identity = match self.identity.create_identity(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                self.restore(previous);
                return Err(e.into());
            }
        };

        let profile = ProfileDocument {
            username: username.to_string(),
            role,
            email: email.trim().to_string(),
        };
        let written = self
            .identity
            .write_document(USERS_COLLECTION, &identity.uid, profile.to_value())
            .await;
        let signed_out = self.identity.sign_out().await;
        self.update_state(|_| Some(SessionState::LoggedOut));

        written?;
        signed_out?;
        tracing::info!(uid = %identity.uid, role = %role, "Account created");
        Ok(())
    }

    /// Email/password login. The listener completes the transition.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let previous = self.begin_authenticating();
        match self.identity.authenticate(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "Login accepted");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Login rejected");
                self.restore(previous);
                Err(e.into())
            }
        }
    }

    /// Sign in through the external provider.
    ///
    /// Returns the identity when it has no profile yet and a role must be
    /// chosen with [`finalize_role_selection`](Self::finalize_role_selection).
    pub async fn sign_in_with_external_provider(&self) -> Result<Option<Identity>, SessionError> {
        let previous = self.begin_authenticating();
        let identity = match self.identity.authenticate_with_provider().await {
            Ok(identity) => identity,
            Err(e) => {
                self.restore(previous);
                return Err(e.into());
            }
        };

        if self.read_profile(&identity.uid).await.is_some() {
            return Ok(None);
        }

        tracing::info!(uid = %identity.uid, "New provider identity, awaiting role selection");
        let pending = identity.clone();
        self.update_state(move |current| match current {
            SessionState::LoggedIn {
                identity: known,
                role: Some(_),
                ..
            } if known.uid == pending.uid => None,
            _ => Some(SessionState::AwaitingRoleSelection { identity: pending }),
        });
        Ok(Some(identity))
    }

    /// Persist the chosen role for a provider identity and log it in
    pub async fn finalize_role_selection(
        &self,
        identity: &Identity,
        role: Role,
    ) -> Result<SessionState, SessionError> {
        let signed_in = self.identity.current_identity();
        if signed_in.as_ref().map(|i| i.uid.as_str()) != Some(identity.uid.as_str()) {
            return Err(SessionError::NotSignedIn(identity.uid.clone()));
        }

        let profile = ProfileDocument {
            username: identity.default_username(),
            role,
            email: identity.email.clone().unwrap_or_default(),
        };
        self.identity
            .write_document(USERS_COLLECTION, &identity.uid, profile.to_value())
            .await?;

        if let Some(profile) = self.read_profile(&identity.uid).await {
            let identity = identity.clone();
            self.update_state(move |_| {
                Some(SessionState::LoggedIn {
                    identity,
                    username: Some(profile.username),
                    role: Some(profile.role),
                })
            });
        }
        tracing::info!(uid = %identity.uid, role = %role, "Role selected");
        Ok(self.state())
    }

    /// Finalize using the identity currently awaiting role selection
    pub async fn select_role(&self, role: Role) -> Result<SessionState, SessionError> {
        let pending = match self.state() {
            SessionState::AwaitingRoleSelection { identity } => identity,
            _ => return Err(SessionError::NoPendingIdentity),
        };
        self.finalize_role_selection(&pending, role).await
    }

    pub async fn log_out(&self) -> Result<(), SessionError> {
        self.identity.sign_out().await?;
        Ok(())
    }

    /// Register user activity. Returns whether an idle timer was reset.
    pub fn record_activity(&self, signal: ActivitySignal) -> bool {
        if !self.state.borrow().is_logged_in() {
            return false;
        }
        let idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        match idle.as_ref() {
            Some(timer) => {
                tracing::trace!(?signal, "Activity");
                timer.reset();
                true
            }
            None => false,
        }
    }

    /// Stop the listener and any running idle timer
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(timer) = self.idle.lock().unwrap_or_else(|e| e.into_inner()).take() {
            timer.cancel();
        }
    }

    async fn expire(&self) {
        tracing::info!(
            timeout_secs = self.idle_timeout.as_secs(),
            "Session expired after inactivity"
        );
        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!(error = %e, "Sign-out on expiry failed");
        }
        self.update_state(|_| Some(SessionState::LoggedOut));
        metrics::counter!("kiln_session_expired_total").increment(1);

        let notice = SessionNotice::expired();
        if let Some(updates) = &self.updates {
            let _ = updates.send(DashboardUpdate::session_expired(&notice));
        }
        let _ = self.notices.send(notice);
    }

    async fn resolve_identity(&self, identity: Identity) {
        let profile = self.read_profile(&identity.uid).await;

        // A sign-out may have landed while the profile was loading
        let still_current = self
            .identity
            .current_identity()
            .is_some_and(|current| current.uid == identity.uid);
        if !still_current {
            tracing::debug!(uid = %identity.uid, "Discarding stale profile resolution");
            return;
        }

        self.update_state(move |current| Some(merge_profile(current, identity, profile)));
    }

    async fn read_profile(&self, uid: &str) -> Option<ProfileDocument> {
        match self.identity.read_document(USERS_COLLECTION, uid).await {
            Ok(Some(doc)) => {
                let profile = ProfileDocument::from_value(doc);
                if profile.is_none() {
                    tracing::warn!(uid, "Malformed profile document");
                }
                profile
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(uid, error = %e, "Failed to read profile document");
                None
            }
        }
    }

    fn begin_authenticating(&self) -> SessionState {
        let previous = self.state();
        self.update_state(|_| Some(SessionState::Authenticating));
        previous
    }

    fn restore(&self, previous: SessionState) {
        self.update_state(move |current| {
            (*current == SessionState::Authenticating).then_some(previous)
        });
    }

    /// Apply `f`'s replacement state, if any and if it differs
    fn update_state<F>(&self, f: F)
    where
        F: FnOnce(&SessionState) -> Option<SessionState>,
    {
        let mut changed = None;
        self.state.send_if_modified(|current| match f(current) {
            Some(next) if next != *current => {
                *current = next.clone();
                changed = Some(next);
                true
            }
            _ => false,
        });

        if let Some(state) = changed {
            tracing::debug!(state = state.name(), "Session transition");
            metrics::counter!("kiln_session_transitions_total", "state" => state.name())
                .increment(1);
            self.sync_idle_timer(&state);
        }
    }

    fn sync_idle_timer(&self, state: &SessionState) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if !state.is_logged_in() {
            if let Some(timer) = idle.take() {
                timer.cancel();
            }
            return;
        }

        if idle.as_ref().is_some_and(|timer| !timer.is_finished()) {
            return;
        }

        let this = self.this.clone();
        *idle = Some(IdleTimer::start(
            self.idle_timeout,
            &self.shutdown,
            move || async move {
                if let Some(manager) = this.upgrade() {
                    manager.expire().await;
                }
            },
        ));
    }
}

/// Combine a resolved identity with its profile lookup.
///
/// A missing profile never downgrades a pending role selection or an already
/// resolved profile of the same identity.
fn merge_profile(
    current: &SessionState,
    identity: Identity,
    profile: Option<ProfileDocument>,
) -> SessionState {
    match profile {
        Some(profile) => SessionState::LoggedIn {
            identity,
            username: Some(profile.username),
            role: Some(profile.role),
        },
        None => match current {
            SessionState::AwaitingRoleSelection { identity: pending }
                if pending.uid == identity.uid =>
            {
                current.clone()
            }
            SessionState::LoggedIn {
                identity: known,
                role: Some(_),
                ..
            } if known.uid == identity.uid => current.clone(),
            _ => SessionState::LoggedIn {
                identity,
                username: None,
                role: None,
            },
        },
    }
}
