//! Stopping notification for the host process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type StoppingCallback = Box<dyn FnOnce() + Send + 'static>;

/// Host-side stop coordination.
///
/// Long-running tasks watch [`HostLifetime::stopping`]; components that must
/// act before teardown register with [`HostLifetime::on_stopping`].
/// [`HostLifetime::stop_requested`] fires first, before any callback runs.
pub struct HostLifetime {
    requested: CancellationToken,
    stopping: CancellationToken,
    stop_requested: AtomicBool,
    callbacks: Mutex<Vec<StoppingCallback>>,
}

impl HostLifetime {
    pub fn new() -> Self {
        Self {
            requested: CancellationToken::new(),
            stopping: CancellationToken::new(),
            stop_requested: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback to run when the host starts stopping.
    ///
    /// Runs immediately on the calling thread if a stop was already requested.
    pub fn on_stopping<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut callbacks = self.lock_callbacks();
            if !self.stop_requested.load(Ordering::Acquire) {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Request a graceful stop.
    ///
    /// Cancels the stop-requested token, runs the stopping callbacks on the
    /// calling thread, then cancels the stopping token. Returns `false` if a
    /// stop was already requested.
    pub fn stop_application(&self) -> bool {
        let callbacks = {
            let mut callbacks = self.lock_callbacks();
            if self.stop_requested.swap(true, Ordering::AcqRel) {
                return false;
            }
            std::mem::take(&mut *callbacks)
        };
        self.requested.cancel();

        tracing::info!(callbacks = callbacks.len(), "Host stopping");
        for callback in callbacks {
            callback();
        }

        self.stopping.cancel();
        true
    }

    /// Request a graceful stop from async code.
    ///
    /// The callbacks may block, so they run on the blocking pool. Dropping the
    /// handle does not cancel the stop.
    pub fn request_stop(self: &Arc<Self>) -> JoinHandle<bool> {
        let host = Arc::clone(self);
        tokio::task::spawn_blocking(move || host.stop_application())
    }

    /// Token cancelled as soon as a stop is requested, before any callback runs.
    pub fn stop_requested(&self) -> CancellationToken {
        self.requested.clone()
    }

    /// Token cancelled once every stopping callback has returned.
    pub fn stopping(&self) -> CancellationToken {
        self.stopping.clone()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<StoppingCallback>> {
        self.callbacks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for HostLifetime {
    fn default() -> Self {
        Self::new()
    }
}
