//! Readiness gate for the scheduler.
//!
//! The scheduler must not run before the host has published its web
//! application path. The gate polls a provider for that value; there is no
//! push notification.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Source of the externally-set readiness value.
pub trait ReadinessProvider: Send + Sync {
    /// Current value, if any. Empty strings count as "not ready".
    fn ready_value(&self) -> Option<String>;
}

impl<F> ReadinessProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn ready_value(&self) -> Option<String> {
        self()
    }
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("readiness wait cancelled")]
    Cancelled,

    #[error("application not ready after {0:?}")]
    TimedOut(Duration),

    #[error("failed to build readiness runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Poll-until-ready gate.
#[derive(Clone)]
pub struct ReadinessGate {
    provider: Arc<dyn ReadinessProvider>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ReadinessGate {
    /// Create a gate with no upper bound on the wait.
    pub fn new(provider: Arc<dyn ReadinessProvider>, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn current(&self) -> Option<String> {
        self.provider.ready_value().filter(|v| !v.is_empty())
    }

    /// Wait until the provider reports a non-empty value.
    ///
    /// Checks immediately, then once per poll interval. Cancellation wins over
    /// a value that becomes ready at the same instant.
    pub async fn wait_until_ready(&self, cancel: &CancellationToken) -> Result<String, ReadinessError> {
        let poll = async {
            let mut ticker = time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Some(value) = self.current() {
                    return value;
                }
                tracing::trace!("Application not ready yet");
            }
        };

        let bounded = async {
            match self.timeout {
                Some(limit) => time::timeout(limit, poll)
                    .await
                    .map_err(|_| ReadinessError::TimedOut(limit)),
                None => Ok(poll.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReadinessError::Cancelled),
            result = bounded => result,
        }
    }

    /// Blocking form of [`Self::wait_until_ready`] for the dedicated scheduler
    /// thread. Must not be called from inside a Tokio runtime.
    pub fn block_until_ready(&self, cancel: &CancellationToken) -> Result<String, ReadinessError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.wait_until_ready(cancel))
    }
}
