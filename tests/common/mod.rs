//! Shared fakes for lifecycle integration tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use report_server::events::{AuditKind, AuditLog, DiagnosticLog, EntryLevel, LifecycleEvents, SinkError};
use report_server::lifecycle::{Collaborators, Lifecycle, LifecycleConfig};
use report_server::repository::{Repository, RepositoryConfig};
use report_server::scheduler::{Scheduler, SchedulerError};

/// One call into either sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Diagnostic(EntryLevel, String),
    Audit(AuditKind, String),
}

/// Sink that remembers every call, in order.
#[derive(Default)]
pub struct RecordingLog {
    records: Mutex<Vec<Record>>,
}

#[allow(dead_code)]
impl RecordingLog {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Diagnostic(_, message) => Some(message),
                Record::Audit(..) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Diagnostic(EntryLevel::Error, message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn audits(&self) -> Vec<(AuditKind, String)> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Audit(kind, message) => Some((kind, message)),
                Record::Diagnostic(..) => None,
            })
            .collect()
    }

    pub fn count_diagnostic(&self, message: &str) -> usize {
        self.diagnostics().iter().filter(|m| *m == message).count()
    }
}

impl DiagnosticLog for RecordingLog {
    fn write_entry(&self, level: EntryLevel, message: &str) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap()
            .push(Record::Diagnostic(level, message.to_string()));
        Ok(())
    }
}

impl AuditLog for RecordingLog {
    fn log_event(&self, kind: AuditKind, message: &str) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap()
            .push(Record::Audit(kind, message.to_string()));
        Ok(())
    }
}

#[allow(dead_code)]
pub enum Behavior {
    BlockUntilShutdown,
    /// Like `BlockUntilShutdown`, but `shutdown()` takes this long to drain.
    DrainSlowly(Duration),
    FailImmediately(&'static str),
}

/// Scheduler double that counts calls.
pub struct FakeScheduler {
    behavior: Behavior,
    runs: AtomicUsize,
    shutdowns: AtomicUsize,
    first_run_at: Mutex<Option<Instant>>,
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

#[allow(dead_code)]
impl FakeScheduler {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            runs: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            first_run_at: Mutex::new(None),
            stopped: Mutex::new(false),
            wakeup: Condvar::new(),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn first_run_at(&self) -> Option<Instant> {
        *self.first_run_at.lock().unwrap()
    }
}

impl Scheduler for FakeScheduler {
    fn run(&self) -> Result<(), SchedulerError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.first_run_at.lock().unwrap().get_or_insert_with(Instant::now);

        match self.behavior {
            Behavior::FailImmediately(message) => Err(SchedulerError::Failed(message.to_string())),
            Behavior::BlockUntilShutdown | Behavior::DrainSlowly(_) => {
                let mut stopped = self.stopped.lock().unwrap();
                while !*stopped {
                    stopped = self.wakeup.wait(stopped).unwrap();
                }
                Ok(())
            }
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if let Behavior::DrainSlowly(drain) = self.behavior {
            std::thread::sleep(drain);
        }
        *self.stopped.lock().unwrap() = true;
        self.wakeup.notify_all();
    }
}

/// A lifecycle wired to fakes.
#[allow(dead_code)]
pub struct Harness {
    pub lifecycle: Lifecycle,
    pub log: Arc<RecordingLog>,
    pub scheduler: Arc<FakeScheduler>,
    pub repository: Arc<Repository>,
}

#[allow(dead_code)]
pub fn lifecycle_config(enabled: bool, globally: bool, poll: Duration) -> LifecycleConfig {
    LifecycleConfig {
        scheduler_enabled: enabled,
        scheduler_enabled_globally: globally,
        readiness_poll_interval: poll,
        ..LifecycleConfig::default()
    }
}

#[allow(dead_code)]
pub fn start(config: LifecycleConfig, behavior: Behavior, ready: bool) -> Harness {
    let log = Arc::new(RecordingLog::default());
    let scheduler = FakeScheduler::new(behavior);
    let repository = Arc::new(Repository::new(
        PathBuf::from("/repository"),
        RepositoryConfig {
            use_scheduler: config.scheduler_enabled_globally,
        },
    ));
    if ready {
        repository.set_web_application_path("/srv/web");
    }

    let lifecycle = Lifecycle::start(
        config,
        Collaborators {
            scheduler: scheduler.clone(),
            readiness: repository.clone(),
            events: LifecycleEvents::new(log.clone(), log.clone()),
        },
    );

    Harness {
        lifecycle,
        log,
        scheduler,
        repository,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
