//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        online_users: state.hub.current_count(),
        hub: state.hub.metrics(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let (database, latency) = match state.db.ping().await {
        Ok(elapsed) => ("connected", Some(elapsed.as_millis() as u64)),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ("unreachable", None)
        }
    };

    let shutting_down = state.hub.is_shutting_down();
    let status = if latency.is_some() && !shutting_down {
        "ok"
    } else {
        "degraded"
    };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        database_latency_ms: latency,
        online_users: state.hub.current_count(),
        shutting_down,
        hub: state.hub.metrics(),
    }))
}
