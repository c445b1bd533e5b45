//! Gateway health API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub sessions: usize,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let now = Utc::now();
    Json(HealthReport {
        status: "ok",
        service: "tripforge",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.controller.provider_name().to_string(),
        sessions: state.controller.store().len().await,
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
        timestamp: now,
    })
}
