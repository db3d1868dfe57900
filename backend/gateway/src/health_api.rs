//! Liveness endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub resolvers: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let now = Utc::now();
    Json(HealthReport {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        resolvers: state
            .manager
            .strategy_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        timestamp: now,
    })
}
