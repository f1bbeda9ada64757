//! Placeholder scheduler that only reports it is alive.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::scheduler::{Scheduler, SchedulerError};

/// Ticks at a fixed interval until shut down.
#[derive(Debug)]
pub struct HeartbeatScheduler {
    interval: Duration,
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

impl HeartbeatScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stopped: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }
}

impl Scheduler for HeartbeatScheduler {
    fn run(&self) -> Result<(), SchedulerError> {
        let mut stopped = self
            .stopped
            .lock()
            .map_err(|_| SchedulerError::Failed("heartbeat state poisoned".into()))?;
        let mut ticks: u64 = 0;

        while !*stopped {
            let (guard, timeout) = self
                .wakeup
                .wait_timeout(stopped, self.interval)
                .map_err(|_| SchedulerError::Failed("heartbeat state poisoned".into()))?;
            stopped = guard;
            if timeout.timed_out() {
                ticks += 1;
                tracing::debug!(ticks, "Scheduler heartbeat");
            }
        }

        tracing::info!(ticks, "Scheduler loop finished");
        Ok(())
    }

    fn shutdown(&self) {
        match self.stopped.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.wakeup.notify_all();
    }
}
