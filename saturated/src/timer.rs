//! One-shot flush timer.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

/// A cancellable one-shot wake-up backed by a tokio task.
///
/// At most one wake-up is pending: arming aborts the previous task. Every
/// arming bumps the epoch, and the epoch is handed to the fire callback so the
/// owner can tell a current wake-up from one that was superseded while it was
/// already running.
pub(crate) struct Timer {
    epoch: u64,
    pending: Option<AbortHandle>,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Self {
            epoch: 0,
            pending: None,
        }
    }

    /// Schedule `fire(epoch)` to run `after` from now, replacing any pending
    /// wake-up.
    pub(crate) fn arm<F>(&mut self, runtime: &Handle, after: Duration, fire: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.epoch = self.epoch.wrapping_add(1);
        let epoch = self.epoch;
        // No representable deadline means the wake-up never comes.
        let deadline = Instant::now().checked_add(after);
        let task = runtime.spawn(async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
            fire(epoch);
        });
        self.pending = Some(task.abort_handle());
        trace!("Timer armed (epoch={}, after={:?})", epoch, after);
    }

    /// Abort the pending wake-up, if any. Safe to call repeatedly.
    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            // Aborting the task that is currently firing is a no-op for it:
            // the callback runs to completion.
            task.abort();
        }
    }

    /// Reports whether `epoch` belongs to the wake-up that is still pending.
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.pending.is_some() && self.epoch == epoch
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
