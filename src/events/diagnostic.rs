//! Diagnostic log backed by `tracing`.

use crate::events::{DiagnosticLog, EntryLevel, SinkError};

/// Writes diagnostic entries as tracing events on the `lifecycle` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnosticLog;

impl DiagnosticLog for TracingDiagnosticLog {
    fn write_entry(&self, level: EntryLevel, message: &str) -> Result<(), SinkError> {
        match level {
            EntryLevel::Information => tracing::info!(target: "lifecycle", "{}", message),
            EntryLevel::Warning => tracing::warn!(target: "lifecycle", "{}", message),
            EntryLevel::Error => tracing::error!(target: "lifecycle", "{}", message),
        }
        Ok(())
    }
}
