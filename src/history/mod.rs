//! Bounded history store
//!
//! Holds the process-wide record of recent KPI samples, plant log entries
//! and the plant status. All mutation goes through [`HistoryStore::dispatch`],
//! which runs the pure reducer in [`HistoryState::apply`] and swaps the
//! shared snapshot. Readers get an `Arc` to an immutable snapshot.

mod state;
mod types;

#[cfg(test)]
mod tests;

pub use state::*;
pub use types::*;

use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::dashboard::types::DashboardUpdate;

/// Owner of the current [`HistoryState`] snapshot.
pub struct HistoryStore {
    state: RwLock<Arc<HistoryState>>,
    /// Optional WebSocket broadcast sender for dashboard updates
    updates: Option<broadcast::Sender<DashboardUpdate>>,
}

impl HistoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(HistoryState::new())),
            updates: None,
        }
    }

    /// Publish every applied action to dashboard clients.
    pub fn with_broadcast(mut self, sender: broadcast::Sender<DashboardUpdate>) -> Self {
        self.updates = Some(sender);
        self
    }

    /// Apply an action. Actions are applied in the order they are dispatched.
    pub fn dispatch(&self, action: Action) {
        let update = self.updates.as_ref().map(|_| DashboardUpdate::from(&action));
        let name = action.name();

        {
            let mut guard = match self.state.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Clones only when a reader still holds the previous snapshot.
            let current = std::mem::take(&mut *guard);
            *guard = Arc::new(Arc::unwrap_or_clone(current).apply(action));

            // Sent under the write lock so subscribers see updates in apply order.
            if let (Some(sender), Some(update)) = (&self.updates, update) {
                // No receivers is fine
                let _ = sender.send(update);
            }
        }

        metrics::counter!("kiln_history_actions_total", "action" => name).increment(1);
        tracing::trace!(action = name, "History action applied");
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<HistoryState> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
