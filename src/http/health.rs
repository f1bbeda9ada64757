use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::lifecycle::SupervisorStatus;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub ready: bool,
    pub scheduler: SupervisorStatus,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    let status = if state.host.is_stop_requested() {
        "stopping"
    } else {
        "operational"
    };

    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        ready: state.repository.web_application_path().is_some(),
        scheduler: state.scheduler.borrow().clone(),
    })
}
