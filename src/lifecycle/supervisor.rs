//! Scheduler supervision.
//!
//! # Responsibilities
//! - Decide once whether the scheduler runs in this process
//! - Run it on a dedicated thread after the readiness gate opens
//! - Contain every failure of the supervised run (errors and panics)
//! - Stop it during shutdown, if and only if it was launched

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::events::LifecycleEvents;
use crate::lifecycle::readiness::{ReadinessError, ReadinessGate};
use crate::lifecycle::startup::LifecycleConfig;
use crate::lifecycle::LifecycleError;
use crate::observability::metrics;
use crate::scheduler::{Scheduler, SchedulerError};

pub const SCHEDULER_THREAD_NAME: &str = "report-scheduler";

/// Observable state of the supervised scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SupervisorStatus {
    /// No start decision yet.
    Idle,
    /// One of the enablement flags is off.
    Disabled,
    WaitingForReadiness,
    Running,
    /// `run()` returned normally.
    Exited,
    /// Stopped before the scheduler started running.
    Cancelled,
    Failed(String),
}

/// Anything that ended the supervised run abnormally.
#[derive(Debug, Error)]
pub enum SchedulerStartupFailure {
    #[error("scheduler readiness wait failed: {0}")]
    Readiness(#[from] ReadinessError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("scheduler panicked: {0}")]
    Panicked(String),
}

/// Starts and stops the scheduler on behalf of the host process.
pub struct SchedulerSupervisor {
    scheduler: Arc<dyn Scheduler>,
    gate: ReadinessGate,
    events: LifecycleEvents,
    decision: OnceLock<bool>,
    launched: AtomicBool,
    stopped: AtomicBool,
    cancel: CancellationToken,
    status: Arc<watch::Sender<SupervisorStatus>>,
}

impl SchedulerSupervisor {
    pub fn new(scheduler: Arc<dyn Scheduler>, gate: ReadinessGate, events: LifecycleEvents) -> Self {
        let (status, _) = watch::channel(SupervisorStatus::Idle);
        Self {
            scheduler,
            gate,
            events,
            decision: OnceLock::new(),
            launched: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            status: Arc::new(status),
        }
    }

    /// Launch the scheduler thread if both enablement flags are set.
    ///
    /// Never blocks. Only the first call decides; later calls return the
    /// first decision without side effects.
    pub fn maybe_start(&self, config: &LifecycleConfig) -> Result<bool, LifecycleError> {
        let mut first_call = false;
        let enabled = *self.decision.get_or_init(|| {
            first_call = true;
            config.scheduler_should_run()
        });
        if !first_call {
            return Ok(enabled && self.launched.load(Ordering::Acquire));
        }

        if !enabled {
            tracing::info!(
                scheduler_enabled = config.scheduler_enabled,
                scheduler_enabled_globally = config.scheduler_enabled_globally,
                "Scheduler disabled for this process"
            );
            self.status.send_replace(SupervisorStatus::Disabled);
            return Ok(false);
        }

        self.events.scheduler_starting();
        self.status.send_replace(SupervisorStatus::WaitingForReadiness);

        let task = SupervisedRun {
            scheduler: Arc::clone(&self.scheduler),
            gate: self.gate.clone(),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            status: Arc::clone(&self.status),
        };

        match thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || task.run())
        {
            Ok(_) => {
                self.launched.store(true, Ordering::Release);
                Ok(true)
            }
            Err(e) => {
                self.status.send_replace(SupervisorStatus::Failed(e.to_string()));
                Err(LifecycleError::Spawn(e))
            }
        }
    }

    /// Stop the scheduler. A no-op unless it was launched; runs once.
    pub fn stop(&self) {
        if !self.launched.load(Ordering::Acquire) {
            tracing::debug!("Scheduler was not started, nothing to stop");
            return;
        }
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::info!("Stopping scheduler");
        self.cancel.cancel();
        self.scheduler.shutdown();
    }

    pub fn was_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }

    pub fn status(&self) -> watch::Receiver<SupervisorStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> SupervisorStatus {
        self.status.borrow().clone()
    }
}

/// Everything the scheduler thread owns.
struct SupervisedRun {
    scheduler: Arc<dyn Scheduler>,
    gate: ReadinessGate,
    events: LifecycleEvents,
    cancel: CancellationToken,
    status: Arc<watch::Sender<SupervisorStatus>>,
}

impl SupervisedRun {
    fn run(self) {
        let outcome = self.supervise();
        metrics::set_scheduler_running(false);

        match outcome {
            Ok(()) => {
                tracing::info!("Scheduler exited");
                self.status.send_replace(SupervisorStatus::Exited);
            }
            Err(SchedulerStartupFailure::Readiness(ReadinessError::Cancelled)) => {
                tracing::info!("Scheduler stopped before the application became ready");
                self.status.send_replace(SupervisorStatus::Cancelled);
            }
            Err(e) => {
                metrics::record_scheduler_failure();
                let message = e.to_string();
                self.events.scheduler_failed(&message);
                self.status.send_replace(SupervisorStatus::Failed(message));
            }
        }
    }

    fn supervise(&self) -> Result<(), SchedulerStartupFailure> {
        let web_application_path = self.gate.block_until_ready(&self.cancel)?;
        if self.cancel.is_cancelled() {
            return Err(ReadinessError::Cancelled.into());
        }

        tracing::info!(%web_application_path, "Application ready, running scheduler");
        self.status.send_replace(SupervisorStatus::Running);
        metrics::set_scheduler_running(true);

        let scheduler = Arc::clone(&self.scheduler);
        panic::catch_unwind(AssertUnwindSafe(move || scheduler.run()))
            .map_err(|payload| SchedulerStartupFailure::Panicked(panic_message(payload.as_ref())))??;
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AuditKind, AuditLog, DiagnosticLog, EntryLevel, SinkError};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Log(Mutex<Vec<(EntryLevel, String)>>);

    impl DiagnosticLog for Log {
        fn write_entry(&self, level: EntryLevel, message: &str) -> Result<(), SinkError> {
            self.0.lock().unwrap().push((level, message.to_string()));
            Ok(())
        }
    }

    impl AuditLog for Log {
        fn log_event(&self, _: AuditKind, _: &str) -> Result<(), SinkError> {
            Ok(())
        }
    }

    struct Panicking;

    impl Scheduler for Panicking {
        fn run(&self) -> Result<(), SchedulerError> {
            panic!("job table corrupted");
        }

        fn shutdown(&self) {}
    }

    #[derive(Default)]
    struct Counting {
        shutdowns: AtomicUsize,
    }

    impl Scheduler for Counting {
        fn run(&self) -> Result<(), SchedulerError> {
            Ok(())
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(enabled: bool, globally: bool) -> LifecycleConfig {
        LifecycleConfig {
            scheduler_enabled: enabled,
            scheduler_enabled_globally: globally,
            readiness_poll_interval: Duration::from_millis(5),
            ..LifecycleConfig::default()
        }
    }

    fn supervisor(scheduler: Arc<dyn Scheduler>, log: Arc<Log>) -> SchedulerSupervisor {
        let gate = ReadinessGate::new(Arc::new(|| Some("/srv/web".to_string())), Duration::from_millis(5));
        SchedulerSupervisor::new(scheduler, gate, LifecycleEvents::new(log.clone(), log))
    }

    async fn settled(supervisor: &SchedulerSupervisor) -> SupervisorStatus {
        let mut rx = supervisor.status();
        let status = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| {
                matches!(
                    s,
                    SupervisorStatus::Exited | SupervisorStatus::Failed(_) | SupervisorStatus::Cancelled
                )
            }),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        status
    }

    #[tokio::test]
    async fn test_panic_in_run_is_contained_and_logged() {
        let log = Arc::new(Log::default());
        let supervisor = supervisor(Arc::new(Panicking), log.clone());

        assert!(supervisor.maybe_start(&config(true, true)).unwrap());
        let status = settled(&supervisor).await;

        assert_eq!(status, SupervisorStatus::Failed("scheduler panicked: job table corrupted".into()));
        let entries = log.0.lock().unwrap();
        assert!(entries
            .iter()
            .any(|(level, msg)| *level == EntryLevel::Error && msg.contains("job table corrupted")));
    }

    #[tokio::test]
    async fn test_second_maybe_start_is_noop() {
        let log = Arc::new(Log::default());
        let scheduler = Arc::new(Counting::default());
        let supervisor = supervisor(scheduler, log.clone());

        assert!(supervisor.maybe_start(&config(true, true)).unwrap());
        assert!(supervisor.maybe_start(&config(false, false)).unwrap());
        settled(&supervisor).await;

        let starts = log
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, msg)| msg == crate::events::SCHEDULER_STARTING)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let scheduler = Arc::new(Counting::default());
        let supervisor = supervisor(scheduler.clone(), Arc::new(Log::default()));

        assert!(!supervisor.maybe_start(&config(true, false)).unwrap());
        supervisor.stop();

        assert_eq!(scheduler.shutdowns.load(Ordering::SeqCst), 0);
        assert_eq!(supervisor.current_status(), SupervisorStatus::Disabled);
    }

    #[tokio::test]
    async fn test_stop_calls_shutdown_once() {
        let scheduler = Arc::new(Counting::default());
        let supervisor = supervisor(scheduler.clone(), Arc::new(Log::default()));

        supervisor.maybe_start(&config(true, true)).unwrap();
        supervisor.stop();
        supervisor.stop();

        assert_eq!(scheduler.shutdowns.load(Ordering::SeqCst), 1);
    }
}
