//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the report
//! server. All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the report server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Host process settings (bind address, flags, repository location).
    pub server: ServerSection,

    /// Scheduler supervision settings.
    pub scheduler: SchedulerConfig,

    /// Audit trail settings.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Host process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Verbose diagnostics.
    pub debug_mode: bool,

    /// Run the report scheduler inside this process.
    ///
    /// The repository must also allow it (`use_scheduler`).
    pub run_scheduler: bool,

    /// Idle session timeout in minutes.
    pub session_timeout_minutes: u32,

    /// Root folder of the shared report repository.
    pub repository_path: PathBuf,

    /// Upper bound for the whole host shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            debug_mode: false,
            run_scheduler: false,
            session_timeout_minutes: 60,
            repository_path: PathBuf::from("./repository"),
            shutdown_timeout_secs: 30,
        }
    }
}

/// Scheduler supervision configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Readiness poll interval in milliseconds.
    pub readiness_poll_ms: u64,

    /// Give up waiting for readiness after this many seconds.
    /// Absent means wait forever (until shutdown).
    pub readiness_timeout_secs: Option<u64>,
}

impl SchedulerConfig {
    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            readiness_poll_ms: 1000,
            readiness_timeout_secs: None,
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Write audit events to a JSON-lines file instead of the log stream.
    pub enabled: bool,

    /// Audit file path.
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("audit.log"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
