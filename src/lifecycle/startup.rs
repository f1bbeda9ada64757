//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the lifecycle configuration snapshot
//! - Emit the start events
//! - Decide and launch the scheduler
//! - Hand out the shutdown coordinator
//!
//! # Design Decisions
//! - Enablement flags are read once, before any thread is spawned
//! - Scheduler problems never fail startup; the host keeps serving

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::events::LifecycleEvents;
use crate::host::HostLifetime;
use crate::lifecycle::readiness::{ReadinessGate, ReadinessProvider};
use crate::lifecycle::shutdown::ShutdownCoordinator;
use crate::lifecycle::supervisor::SchedulerSupervisor;
use crate::lifecycle::LifecycleError;
use crate::repository::RepositoryConfig;
use crate::scheduler::Scheduler;

/// Immutable settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub debug_mode: bool,
    /// Local `run_scheduler` flag.
    pub scheduler_enabled: bool,
    /// Repository `use_scheduler` flag.
    pub scheduler_enabled_globally: bool,
    pub session_timeout_minutes: u32,
    pub readiness_poll_interval: Duration,
    pub readiness_timeout: Option<Duration>,
}

impl LifecycleConfig {
    pub fn resolve(server: &ServerConfig, repository: &RepositoryConfig) -> Self {
        Self {
            debug_mode: server.server.debug_mode,
            scheduler_enabled: server.server.run_scheduler,
            scheduler_enabled_globally: repository.use_scheduler,
            session_timeout_minutes: server.server.session_timeout_minutes,
            readiness_poll_interval: server.scheduler.readiness_poll_interval(),
            readiness_timeout: server.scheduler.readiness_timeout(),
        }
    }

    /// Both flags must agree.
    pub fn scheduler_should_run(&self) -> bool {
        self.scheduler_enabled && self.scheduler_enabled_globally
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            scheduler_enabled: false,
            scheduler_enabled_globally: false,
            session_timeout_minutes: 60,
            readiness_poll_interval: Duration::from_secs(1),
            readiness_timeout: None,
        }
    }
}

/// External collaborators injected into the lifecycle.
pub struct Collaborators {
    pub scheduler: Arc<dyn Scheduler>,
    pub readiness: Arc<dyn ReadinessProvider>,
    pub events: LifecycleEvents,
}

/// The started process lifecycle.
pub struct Lifecycle {
    config: LifecycleConfig,
    supervisor: Arc<SchedulerSupervisor>,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Lifecycle {
    /// Emit the start events and launch the scheduler if enabled.
    pub fn start(config: LifecycleConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            scheduler,
            readiness,
            events,
        } = collaborators;

        tracing::info!(
            debug_mode = config.debug_mode,
            session_timeout_minutes = config.session_timeout_minutes,
            scheduler_enabled = config.scheduler_enabled,
            scheduler_enabled_globally = config.scheduler_enabled_globally,
            "Lifecycle configuration resolved"
        );

        events.server_starting();

        let gate = ReadinessGate::new(readiness, config.readiness_poll_interval)
            .with_timeout(config.readiness_timeout);
        let supervisor = Arc::new(SchedulerSupervisor::new(scheduler, gate, events.clone()));
        let coordinator = Arc::new(ShutdownCoordinator::new(Arc::clone(&supervisor), events.clone()));

        if let Err(e) = supervisor.maybe_start(&config) {
            events.scheduler_failed(&e.to_string());
        }

        Self {
            config,
            supervisor,
            coordinator,
        }
    }

    /// Wire host stopping and OS interrupts into the shutdown sequence.
    pub fn install(&self, host: &Arc<HostLifetime>) -> Result<JoinHandle<()>, LifecycleError> {
        self.coordinator.install(host)
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &Arc<SchedulerSupervisor> {
        &self.supervisor
    }

    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }
}
