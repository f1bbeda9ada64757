//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the default filter from config and debug mode
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over the configured level
//! - JSON format for production, pretty format for development
//! - Lifecycle and audit events use their own targets (`lifecycle`, `audit`)

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directives when `RUST_LOG` is not set.
pub fn default_filter(config: &ObservabilityConfig, debug_mode: bool) -> String {
    let level = if debug_mode { "debug" } else { config.log_level.as_str() };
    format!(
        "warn,report_server={level},lifecycle={level},audit=info,tower_http={level}"
    )
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig, debug_mode: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(config, debug_mode).into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    }
}
