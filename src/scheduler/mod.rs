//! Scheduler collaborator contract.
//!
//! The report scheduler owns its run loop, its job execution and the
//! cancellation of in-flight jobs. The lifecycle layer only needs to start
//! the loop on a dedicated thread and ask it to stop.

pub mod heartbeat;

use thiserror::Error;

pub use heartbeat::HeartbeatScheduler;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler failed: {0}")]
    Failed(String),

    #[error("scheduler IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A long-running job scheduler.
///
/// `shutdown` may be called before `run` has started: the supervisor can stop
/// between the readiness check and the call to `run`. Implementations must
/// latch the stop so that a later `run` returns immediately.
pub trait Scheduler: Send + Sync + 'static {
    /// Run the scheduler loop. Blocks until `shutdown` is called, and returns
    /// at once if it already was.
    fn run(&self) -> Result<(), SchedulerError>;

    /// Request a graceful stop. May block until in-flight work has drained.
    fn shutdown(&self);
}
