/// Liveness endpoint, served outside `/api` and without a token
use crate::{context::AppContext, db};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// 200 when the database answers `SELECT 1`, 503 otherwise
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let (code, status, database) = match db::test_connection(&ctx.db).await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}
