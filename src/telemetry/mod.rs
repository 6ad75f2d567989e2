//! Telemetry feed boundary
//!
//! A [`TelemetryFeed`] pushes [`FeedPayload`]s to a callback at its own
//! cadence until the returned [`FeedHandle`] is stopped or dropped. The
//! [`Ingestor`] sits between a feed and the history store and is the only
//! place payloads are validated.

mod ingest;
mod synthetic;
mod types;

pub use ingest::*;
pub use synthetic::*;
pub use types::*;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Callback invoked for every feed tick
pub type FeedCallback = Arc<dyn Fn(FeedPayload) + Send + Sync>;

/// Source of live plant telemetry.
pub trait TelemetryFeed: Send + Sync {
    /// Start delivering payloads to `callback`.
    fn start(&self, callback: FeedCallback) -> FeedHandle;
}

/// Cancellation handle for a running feed.
///
/// Dropping the handle stops the feed.
pub struct FeedHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Stop further callbacks
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the feed task to exit
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Telemetry feed task failed");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
