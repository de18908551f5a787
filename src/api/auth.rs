/// Login and current-admin endpoints
use crate::{
    admin::{ActivityAction, AdminProfile, Role},
    api::middleware::ApiJson,
    auth::AuthContext,
    context::AppContext,
    error::{AppError, AppResult},
    validation,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Exchange credentials for a bearer token
async fn login(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = validation::trimmed(req.username.as_deref());
    let password = req.password.as_deref().filter(|p| !p.is_empty());

    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let admin = ctx.admins.authenticate(&username, password).await?;
    let token = ctx.tokens.issue(admin.id, &admin.username, admin.role)?;

    tracing::info!("Admin {} logged in", admin.username);
    ctx.activity.record(
        &admin.username,
        ActivityAction::Login,
        format!("{} logged in", admin.username),
    );

    Ok(Json(LoginResponse {
        token,
        admin: AdminSummary {
            id: admin.id,
            username: admin.username,
            role: admin.role,
        },
    }))
}

/// Profile of the admin holding the token
async fn me(State(ctx): State<AppContext>, auth: AuthContext) -> AppResult<Json<AdminProfile>> {
    let profile = ctx
        .admins
        .get_profile(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    Ok(Json(profile))
}
