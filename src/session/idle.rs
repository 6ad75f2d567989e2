//! Inactivity timer for logged-in sessions

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fires `on_expire` once after `timeout` without a [`reset`](Self::reset).
///
/// Dropping the timer cancels it.
pub struct IdleTimer {
    activity: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl IdleTimer {
    pub fn start<F, Fut>(timeout: Duration, parent: &CancellationToken, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let activity = Arc::new(Notify::new());
        let cancel = parent.child_token();

        let task = tokio::spawn({
            let activity = Arc::clone(&activity);
            let cancel = cancel.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        _ = activity.notified() => continue,
                        _ = tokio::time::sleep(timeout) => break,
                    }
                }
                on_expire().await;
            }
        });

        Self {
            activity,
            cancel,
            task,
        }
    }

    /// Restart the countdown
    pub fn reset(&self) {
        self.activity.notify_one();
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
