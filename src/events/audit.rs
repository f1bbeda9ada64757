//! Audit trail sinks.
//!
//! `TracingAuditLog` routes audit events into the log stream on the `audit`
//! target. `JsonFileAuditLog` appends one JSON record per line to a file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::events::{AuditKind, AuditLog, SinkError};

/// Audit sink that emits tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn log_event(&self, kind: AuditKind, message: &str) -> Result<(), SinkError> {
        tracing::info!(target: "audit", kind = %kind, "{}", message);
        Ok(())
    }
}

/// One line of the audit file.
#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    id: Uuid,
    timestamp_ms: u128,
    kind: AuditKind,
    message: &'a str,
}

/// Append-only JSON-lines audit file.
#[derive(Debug)]
pub struct JsonFileAuditLog {
    file: Mutex<File>,
}

impl JsonFileAuditLog {
    /// Open (or create) the audit file in append mode.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl AuditLog for JsonFileAuditLog {
    fn log_event(&self, kind: AuditKind, message: &str) -> Result<(), SinkError> {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let mut line = serde_json::to_vec(&AuditRecord {
            id: Uuid::new_v4(),
            timestamp_ms,
            kind,
            message,
        })?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| SinkError::Unavailable("audit file lock poisoned".into()))?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let audit = JsonFileAuditLog::open(&path).unwrap();
        audit.log_event(AuditKind::EventServer, "Starting Web Report Server").unwrap();
        audit.log_event(AuditKind::EventLoggedUsers, "0").unwrap();
        drop(audit);

        // Reopening appends rather than truncating.
        let audit = JsonFileAuditLog::open(&path).unwrap();
        audit.log_event(AuditKind::EventServer, "Ending Web Report Server").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["kind"], "EventServer");
        assert_eq!(records[1]["kind"], "EventLoggedUsers");
        assert_eq!(records[1]["message"], "0");
        assert_eq!(records[2]["message"], "Ending Web Report Server");
        assert_ne!(records[0]["id"], records[2]["id"]);
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let err = JsonFileAuditLog::open(Path::new("/no/such/dir/audit.log")).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
