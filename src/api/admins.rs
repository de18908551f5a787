/// Admin account management (superadmin only)
use crate::{
    admin::{ActivityAction, AdminProfile},
    api::{
        middleware::{ApiJson, ApiPath},
        MessageResponse,
    },
    auth::SuperAdminContext,
    context::AppContext,
    error::AppResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/admins", get(list_admins).post(create_admin))
        .route("/admins/:id", put(reset_password).delete(delete_admin))
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

async fn list_admins(
    State(ctx): State<AppContext>,
    _auth: SuperAdminContext,
) -> AppResult<Json<Vec<AdminProfile>>> {
    Ok(Json(ctx.admins.list().await?))
}

async fn create_admin(
    State(ctx): State<AppContext>,
    SuperAdminContext(auth): SuperAdminContext,
    ApiJson(req): ApiJson<CreateAdminRequest>,
) -> AppResult<(StatusCode, Json<AdminProfile>)> {
    let admin = ctx
        .admins
        .create(req.username.as_deref(), req.password.as_deref())
        .await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::CreateAdmin,
        format!("Created admin {}", admin.username),
    );

    Ok((StatusCode::CREATED, Json(admin)))
}

async fn reset_password(
    State(ctx): State<AppContext>,
    SuperAdminContext(auth): SuperAdminContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let target = ctx
        .admins
        .reset_password(id, req.password.as_deref())
        .await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::ResetPassword,
        format!("Reset password for {}", target.username),
    );

    Ok(Json(MessageResponse::new(format!(
        "Password for {} has been reset",
        target.username
    ))))
}

async fn delete_admin(
    State(ctx): State<AppContext>,
    SuperAdminContext(auth): SuperAdminContext,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let target = ctx.admins.delete(id).await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::DeleteAdmin,
        format!("Deleted admin {}", target.username),
    );

    Ok(Json(MessageResponse::new(format!(
        "Admin {} deleted",
        target.username
    ))))
}
