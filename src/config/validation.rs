//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("audit is enabled but audit.path is empty")]
    EmptyAuditPath,

    #[error("server.repository_path is empty")]
    EmptyRepositoryPath,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }

    if config.server.session_timeout_minutes == 0 {
        errors.push(ValidationError::Zero { field: "server.session_timeout_minutes" });
    }

    if config.server.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "server.shutdown_timeout_secs" });
    }

    if config.server.repository_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRepositoryPath);
    }

    if config.scheduler.readiness_poll_ms == 0 {
        errors.push(ValidationError::Zero { field: "scheduler.readiness_poll_ms" });
    }

    if config.scheduler.readiness_timeout_secs == Some(0) {
        errors.push(ValidationError::Zero { field: "scheduler.readiness_timeout_secs" });
    }

    if config.audit.enabled && config.audit.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyAuditPath);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
