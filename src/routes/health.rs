//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub view_cache: String,
}

/// Liveness probe: OK while the process runs.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe. The view cache is advisory, so an unreachable Redis
/// degrades the status without failing it.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            format!("error: {e}")
        }
    };

    let view_cache = match state.redis.get_multiplexed_async_connection().await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Redis health check failed");
            format!("error: {e}")
        }
    };

    let status = match (database == "connected", view_cache == "connected") {
        (true, true) => "ok",
        (true, false) => "degraded",
        _ => "unavailable",
    };

    ApiResponse::success(HealthStatus {
        status: status.to_string(),
        database,
        view_cache,
    })
}
