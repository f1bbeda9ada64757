//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Start events → Scheduler decision → Supervisor thread
//!
//! Supervisor thread (supervisor.rs, readiness.rs):
//!     Wait for web application path → Scheduler::run() → outcome logged
//!
//! Shutdown (shutdown.rs):
//!     Host stopping / interrupt → once: stop scheduler → stop events
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → graceful host stop request (never a hard exit)
//! ```
//!
//! # Design Decisions
//! - Collaborators are injected, never looked up globally
//! - The readiness wait is cancellable by shutdown
//! - Shutdown state advances by compare-and-swap

pub mod readiness;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

use thiserror::Error;

pub use readiness::{ReadinessError, ReadinessGate, ReadinessProvider};
pub use shutdown::{ShutdownCoordinator, ShutdownState};
pub use signals::{Interrupt, InterruptDisposition};
pub use startup::{Collaborators, Lifecycle, LifecycleConfig};
pub use supervisor::{SchedulerStartupFailure, SchedulerSupervisor, SupervisorStatus};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("shutdown coordinator already installed")]
    AlreadyInstalled,

    #[error("failed to install interrupt handlers: {0}")]
    Signals(#[source] std::io::Error),
}
