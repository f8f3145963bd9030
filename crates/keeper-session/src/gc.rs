//! Periodic garbage collection of expired sessions.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::manager::SessionManager;

/// Handle to a running GC task.
///
/// Dropping the handle cancels the task. Use [`shutdown`](Self::shutdown)
/// to also wait for it to finish.
#[derive(Debug)]
pub struct GcHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl GcHandle {
    fn inert() -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Whether a GC task was spawned and has not finished.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Ask the task to stop after the current sweep, if any.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Session GC task ended abnormally");
        }
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl SessionManager {
    /// Spawn a task that sweeps expired sessions every lifetime period.
    ///
    /// The first sweep runs one full period after spawning. Sweeps run one
    /// after another on a single task, so a slow sweep delays the next tick
    /// rather than overlapping it. Only one GC task runs per manager: while
    /// one is active, further calls return an inert handle. With a zero
    /// lifetime nothing is spawned and the returned handle is inert.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_gc(self: &Arc<Self>) -> GcHandle {
        if self.lifetime_secs() == 0 {
            debug!("Session lifetime is zero, GC disabled");
            return GcHandle::inert();
        }

        if !self.claim_gc() {
            debug!("Session GC already running");
            return GcHandle::inert();
        }

        let period = Duration::from_secs(self.lifetime_secs());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_gc(Arc::downgrade(self), period, cancel.clone()));

        debug!(period_secs = period.as_secs(), "Session GC started");

        GcHandle {
            cancel,
            task: Some(task),
        }
    }
}

async fn run_gc(manager: Weak<SessionManager>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Session GC cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(manager) = manager.upgrade() else {
                    debug!("Session manager dropped, stopping GC");
                    break;
                };
                let removed = manager.sweep();
                trace!(removed, remaining = manager.len(), "Session GC tick");
            }
        }
    }

    if let Some(manager) = manager.upgrade() {
        manager.release_gc();
    }
}
