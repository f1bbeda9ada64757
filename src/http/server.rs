//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health handler
//! - Wire up middleware (tracing, timeout)
//! - Publish the web application path once the listener is bound
//! - Drain gracefully when the host starts stopping

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::host::HostLifetime;
use crate::http::health::get_health;
use crate::lifecycle::SupervisorStatus;
use crate::repository::Repository;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
    pub scheduler: watch::Receiver<SupervisorStatus>,
    pub host: Arc<HostLifetime>,
}

/// HTTP host for the report server.
pub struct HttpServer {
    router: Router,
    state: AppState,
    web_application_path: String,
}

impl HttpServer {
    pub fn new(state: AppState, web_application_path: impl Into<String>) -> Self {
        let router = Self::build_router(state.clone());
        Self {
            router,
            state,
            web_application_path: web_application_path.into(),
        }
    }

    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the host stopping token is cancelled.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self
            .state
            .repository
            .set_web_application_path(self.web_application_path.clone())
        {
            tracing::info!(path = %self.web_application_path, "Web application path published");
        }

        let stopping = self.state.host.stopping();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { stopping.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
