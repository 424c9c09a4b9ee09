use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the frame store is reachable.
    pub db_healthy: bool,
    /// Enrichment tasks currently queued or running.
    pub enrichment_in_flight: usize,
}

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.store.health_check().await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        enrichment_in_flight: state.enrichment.in_flight(),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
