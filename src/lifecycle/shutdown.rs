//! Shutdown coordination for the report server.
//!
//! Both shutdown triggers converge here: OS interrupts request a host stop,
//! and the host stopping notification runs the sequence. Direct callers of
//! [`ShutdownCoordinator::trigger`] race them; the body runs exactly once.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::events::LifecycleEvents;
use crate::host::HostLifetime;
use crate::lifecycle::signals;
use crate::lifecycle::supervisor::SchedulerSupervisor;
use crate::lifecycle::LifecycleError;
use crate::observability::metrics;

/// Progress of the one-time shutdown sequence.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    NotStarted = 0,
    InProgress = 1,
    Completed = 2,
}

impl From<u8> for ShutdownState {
    fn from(val: u8) -> Self {
        match val {
            1 => ShutdownState::InProgress,
            2 => ShutdownState::Completed,
            _ => ShutdownState::NotStarted,
        }
    }
}

/// Coordinator for graceful shutdown.
pub struct ShutdownCoordinator {
    state: AtomicU8,
    registered: AtomicBool,
    supervisor: Arc<SchedulerSupervisor>,
    events: LifecycleEvents,
    completed: watch::Sender<ShutdownState>,
}

impl ShutdownCoordinator {
    pub fn new(supervisor: Arc<SchedulerSupervisor>, events: LifecycleEvents) -> Self {
        let (completed, _) = watch::channel(ShutdownState::NotStarted);
        Self {
            state: AtomicU8::new(ShutdownState::NotStarted as u8),
            registered: AtomicBool::new(false),
            supervisor,
            events,
            completed,
        }
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from(self.state.load(Ordering::Acquire))
    }

    /// Run the shutdown sequence if no other trigger got here first.
    ///
    /// Returns `true` for the single caller that executed the sequence. Every
    /// other caller returns `false` immediately.
    pub fn trigger(&self) -> bool {
        if self
            .state
            .compare_exchange(
                ShutdownState::NotStarted as u8,
                ShutdownState::InProgress as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(state = ?self.state(), "Shutdown already handled");
            return false;
        }

        let started = Instant::now();
        tracing::info!("Shutdown sequence starting");

        self.supervisor.stop();
        self.events.server_ending();

        self.state.store(ShutdownState::Completed as u8, Ordering::Release);
        self.completed.send_replace(ShutdownState::Completed);
        metrics::record_shutdown_duration(started.elapsed());
        tracing::info!(elapsed = ?started.elapsed(), "Shutdown sequence completed");
        true
    }

    /// Register with the host stopping notification. Allowed once.
    pub fn register(self: &Arc<Self>, host: &HostLifetime) -> Result<(), LifecycleError> {
        if self.registered.swap(true, Ordering::AcqRel) {
            return Err(LifecycleError::AlreadyInstalled);
        }

        let coordinator = Arc::clone(self);
        host.on_stopping(move || {
            coordinator.trigger();
        });
        Ok(())
    }

    /// Register with the host and start listening for OS interrupts.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install(self: &Arc<Self>, host: &Arc<HostLifetime>) -> Result<JoinHandle<()>, LifecycleError> {
        self.register(host)?;
        signals::spawn_interrupt_listener(Arc::clone(host)).map_err(LifecycleError::Signals)
    }

    /// Wait until the sequence has completed.
    pub async fn wait_completed(&self) {
        let mut rx = self.completed.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|s| *s == ShutdownState::Completed).await;
    }
}
