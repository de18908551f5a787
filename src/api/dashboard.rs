/// Dashboard statistics endpoint
use crate::{auth::AuthContext, context::AppContext, dashboard::DashboardStats, error::AppResult};
use axum::{extract::State, routing::get, Json, Router};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/dashboard/stats", get(stats))
}

async fn stats(State(ctx): State<AppContext>, _auth: AuthContext) -> AppResult<Json<DashboardStats>> {
    Ok(Json(ctx.dashboard.stats().await?))
}
