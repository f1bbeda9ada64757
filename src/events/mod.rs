//! Lifecycle event sinks.
//!
//! # Data Flow
//! ```text
//! Lifecycle transition (start, scheduler start/failure, stop)
//!     → LifecycleEvents (best-effort glue)
//!         → DiagnosticLog::write_entry (operational log)
//!         → AuditLog::log_event (audit trail)
//! ```
//!
//! # Design Decisions
//! - Sinks return errors, the glue swallows them after a warning
//! - A failing sink never blocks or aborts a lifecycle transition

pub mod audit;
pub mod diagnostic;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

pub use audit::{JsonFileAuditLog, TracingAuditLog};
pub use diagnostic::TracingDiagnosticLog;

pub const SERVER_STARTING: &str = "Starting Web Report Server";
pub const SERVER_ENDING: &str = "Ending Web Report Server";
pub const SCHEDULER_STARTING: &str = "Starting Scheduler from the Web Report Server";

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryLevel {
    Information,
    Warning,
    Error,
}

/// Audit event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditKind {
    /// Server start/stop.
    EventServer,
    /// Number of logged-in users.
    EventLoggedUsers,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditKind::EventServer => write!(f, "EventServer"),
            AuditKind::EventLoggedUsers => write!(f, "EventLoggedUsers"),
        }
    }
}

/// Failure reported by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Operational log surface.
pub trait DiagnosticLog: Send + Sync {
    fn write_entry(&self, level: EntryLevel, message: &str) -> Result<(), SinkError>;
}

/// Audit trail surface.
pub trait AuditLog: Send + Sync {
    fn log_event(&self, kind: AuditKind, message: &str) -> Result<(), SinkError>;
}

/// Emits lifecycle events to both sinks.
#[derive(Clone)]
pub struct LifecycleEvents {
    diagnostic: Arc<dyn DiagnosticLog>,
    audit: Arc<dyn AuditLog>,
}

impl LifecycleEvents {
    pub fn new(diagnostic: Arc<dyn DiagnosticLog>, audit: Arc<dyn AuditLog>) -> Self {
        Self { diagnostic, audit }
    }

    /// Process start: diagnostic entry, server audit event, logged users reset.
    pub fn server_starting(&self) {
        metrics::record_lifecycle_event("server_starting");
        self.diagnostic(EntryLevel::Information, SERVER_STARTING);
        self.audit(AuditKind::EventServer, SERVER_STARTING);
        self.audit(AuditKind::EventLoggedUsers, "0");
    }

    pub fn scheduler_starting(&self) {
        metrics::record_lifecycle_event("scheduler_starting");
        self.diagnostic(EntryLevel::Information, SCHEDULER_STARTING);
    }

    pub fn scheduler_failed(&self, message: &str) {
        metrics::record_lifecycle_event("scheduler_failed");
        self.diagnostic(EntryLevel::Error, message);
    }

    /// Process stop: diagnostic entry, server audit event, logged users reset.
    pub fn server_ending(&self) {
        metrics::record_lifecycle_event("server_ending");
        self.diagnostic(EntryLevel::Information, SERVER_ENDING);
        self.audit(AuditKind::EventServer, SERVER_ENDING);
        self.audit(AuditKind::EventLoggedUsers, "0");
    }

    fn diagnostic(&self, level: EntryLevel, message: &str) {
        if let Err(e) = self.diagnostic.write_entry(level, message) {
            tracing::warn!(error = %e, entry = message, "Failed to write diagnostic entry");
        }
    }

    fn audit(&self, kind: AuditKind, message: &str) {
        if let Err(e) = self.audit.log_event(kind, message) {
            tracing::warn!(error = %e, kind = %kind, entry = message, "Failed to write audit event");
        }
    }
}
