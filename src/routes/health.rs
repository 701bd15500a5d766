use axum::{extract::State, routing::get, Json, Router};

use crate::models::HealthResponse;
use crate::services::{MetricsSnapshot, SharedMetrics};

#[derive(Clone)]
pub struct HealthState {
    pub session_provider: &'static str,
    pub metrics: SharedMetrics,
}

pub fn router(session_provider: &'static str, metrics: SharedMetrics) -> Router {
    let state = HealthState {
        session_provider,
        metrics,
    };
    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/metrics", get(get_metrics))
        .with_state(state)
}

/// Health check dell'API
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "API funzionante", body = HealthResponse),
    ),
    tag = "Sistema"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_provider: state.session_provider.to_string(),
    })
}

/// Contatori delle risposte generate dal contesto di richiesta
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    responses(
        (status = 200, description = "Contatori di processo", body = MetricsSnapshot),
    ),
    tag = "Sistema"
)]
pub async fn get_metrics(State(state): State<HealthState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
