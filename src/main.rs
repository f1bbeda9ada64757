//! Web report server.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ ServerConfig ──┐
//!   repository.toml ──▶ Repository ─┴─▶ LifecycleConfig
//!                                            │
//!              ┌─────────────────────────────┼──────────────────────────┐
//!              ▼                             ▼                          ▼
//!      start events               SchedulerSupervisor           ShutdownCoordinator
//!   (diagnostic + audit)     (dedicated thread, gated on   (host stopping + SIGINT/SIGTERM,
//!                             web application path)          runs once, stop events)
//!                                            ▲
//!                                            │ publishes path
//!                                       HttpServer
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use report_server::config::{load_config, ServerConfig};
use report_server::events::{AuditLog, JsonFileAuditLog, LifecycleEvents, TracingAuditLog, TracingDiagnosticLog};
use report_server::http::{AppState, HttpServer};
use report_server::lifecycle::{Collaborators, Lifecycle, LifecycleConfig};
use report_server::observability::{logging, metrics};
use report_server::repository::Repository;
use report_server::scheduler::HeartbeatScheduler;
use report_server::HostLifetime;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "report-server")]
#[command(about = "Web report server with an embedded report scheduler", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "REPORT_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let outcome = runtime.block_on(run(cli));
    // Stop callbacks still draining past the deadline must not hold the process.
    runtime.shutdown_background();
    outcome
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind.to_string();
    }

    logging::init_logging(&config.observability, config.server.debug_mode)?;
    tracing::info!("report-server v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let repository = Arc::new(Repository::open(&config.server.repository_path)?);
    tracing::info!(
        path = %repository.root().display(),
        use_scheduler = repository.config().use_scheduler,
        "Repository loaded"
    );

    let audit: Arc<dyn AuditLog> = if config.audit.enabled {
        Arc::new(JsonFileAuditLog::open(&config.audit.path)?)
    } else {
        Arc::new(TracingAuditLog)
    };
    let events = LifecycleEvents::new(Arc::new(TracingDiagnosticLog), audit);

    let lifecycle = Lifecycle::start(
        LifecycleConfig::resolve(&config, repository.config()),
        Collaborators {
            scheduler: Arc::new(HeartbeatScheduler::new(HEARTBEAT_INTERVAL)),
            readiness: repository.clone(),
            events,
        },
    );
    let deadline = Duration::from_secs(config.server.shutdown_timeout_secs);

    let host = Arc::new(HostLifetime::new());
    let _interrupts = match lifecycle.install(&host) {
        Ok(listener) => listener,
        Err(e) => {
            abort_startup(&lifecycle, &host, deadline).await;
            return Err(e.into());
        }
    };

    let (listener, web_application_path) = match bind(&config.server.bind_address).await {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!(error = %e, bind_address = %config.server.bind_address, "Failed to start HTTP host");
            abort_startup(&lifecycle, &host, deadline).await;
            return Err(e.into());
        }
    };
    let server = HttpServer::new(
        AppState {
            repository,
            scheduler: lifecycle.supervisor().status(),
            host: host.clone(),
        },
        web_application_path,
    );

    let stop_requested = host.stop_requested();
    let mut serving = tokio::spawn(server.run(listener));

    let exited_early = tokio::select! {
        _ = stop_requested.cancelled() => None,
        result = &mut serving => Some(result),
    };

    if exited_early.is_some() {
        tracing::warn!("HTTP server exited on its own, stopping host");
        host.request_stop();
    }

    let drained = tokio::time::timeout(deadline, async {
        lifecycle.coordinator().wait_completed().await;
        match exited_early {
            Some(result) => result,
            None => serving.await,
        }
    })
    .await;

    match drained {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(timeout_secs = config.server.shutdown_timeout_secs, "Shutdown deadline exceeded, exiting");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn bind(address: &str) -> std::io::Result<(TcpListener, String)> {
    let listener = TcpListener::bind(address).await?;
    let web_application_path = std::env::current_dir()?.display().to_string();
    Ok((listener, web_application_path))
}

/// Run the shutdown sequence for a host that never came up.
async fn abort_startup(lifecycle: &Lifecycle, host: &Arc<HostLifetime>, deadline: Duration) {
    host.request_stop();
    if tokio::time::timeout(deadline, lifecycle.coordinator().wait_completed())
        .await
        .is_err()
    {
        tracing::warn!(timeout_secs = deadline.as_secs(), "Shutdown deadline exceeded, exiting");
    }
}
