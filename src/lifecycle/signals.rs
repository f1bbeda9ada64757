//! OS signal handling.
//!
//! # Responsibilities
//! - Register interrupt handlers (SIGINT, and SIGTERM on Unix)
//! - Turn an interrupt into a graceful host stop request
//! - Keep the signal from terminating the process
//!
//! # Design Decisions
//! - Uses Tokio's signal handling; once registered, the default
//!   terminate-on-signal action no longer applies
//! - The stop request runs on the blocking pool because the shutdown
//!   sequence may wait for the scheduler to drain
//! - Repeated interrupts while stopping are logged and ignored

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::host::HostLifetime;

/// Interrupt kinds we listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Interrupt => write!(f, "SIGINT"),
            Interrupt::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// How an interrupt was handled.
///
/// In both cases the interrupt is consumed: it does not terminate the process.
/// Exit is left to the host's own shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptDisposition {
    /// This interrupt requested the graceful stop.
    StopRequested,
    /// A stop was already underway.
    AlreadyStopping,
}

/// Source of interrupt notifications.
pub trait InterruptSource: Send {
    /// Next interrupt, or `None` when the source is closed.
    fn recv(&mut self) -> impl Future<Output = Option<Interrupt>> + Send;
}

impl InterruptSource for mpsc::Receiver<Interrupt> {
    async fn recv(&mut self) -> Option<Interrupt> {
        mpsc::Receiver::recv(self).await
    }
}

/// Interrupts delivered by the operating system.
pub struct OsInterrupts {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl OsInterrupts {
    /// Install the handlers. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }
}

impl InterruptSource for OsInterrupts {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<Interrupt> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| Interrupt::Interrupt),
            received = self.terminate.recv() => received.map(|_| Interrupt::Terminate),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<Interrupt> {
        tokio::signal::ctrl_c().await.ok().map(|_| Interrupt::Interrupt)
    }
}

/// Request a graceful host stop in response to an interrupt.
///
/// Runs the host stopping callbacks (and with them the shutdown sequence) on
/// the calling thread.
pub fn handle_interrupt(host: &HostLifetime) -> InterruptDisposition {
    if host.stop_application() {
        InterruptDisposition::StopRequested
    } else {
        InterruptDisposition::AlreadyStopping
    }
}

/// Handle interrupts from `source` until it closes.
pub async fn run_interrupt_loop<S: InterruptSource>(host: Arc<HostLifetime>, mut source: S) {
    while let Some(interrupt) = source.recv().await {
        tracing::info!(signal = %interrupt, "Interrupt received, requesting graceful stop");

        let target = Arc::clone(&host);
        match tokio::task::spawn_blocking(move || handle_interrupt(&target)).await {
            Ok(InterruptDisposition::StopRequested) => {
                tracing::info!(signal = %interrupt, "Graceful stop requested");
            }
            Ok(InterruptDisposition::AlreadyStopping) => {
                tracing::warn!(signal = %interrupt, "Shutdown already in progress, interrupt ignored");
            }
            Err(e) => {
                tracing::error!(error = %e, "Interrupt handling task failed");
            }
        }
    }
}

/// Install the OS interrupt handlers and spawn their listener for `host`.
///
/// The handlers are in place when this returns. Must be called from within a
/// Tokio runtime.
pub fn spawn_interrupt_listener(host: Arc<HostLifetime>) -> std::io::Result<JoinHandle<()>> {
    let source = OsInterrupts::new()?;
    Ok(tokio::spawn(run_interrupt_loop(host, source)))
}
