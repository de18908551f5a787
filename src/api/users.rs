/// Student record endpoints (`/users`)
use crate::{
    admin::ActivityAction,
    api::{
        middleware::{ApiJson, ApiPath, ApiQuery},
        MessageResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::Student,
    error::AppResult,
    student::{StudentPayload, StudentQuery},
};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(ctx.students.list(query.search.as_deref()).await?))
}

async fn get_user(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Student>> {
    Ok(Json(ctx.students.require(id).await?))
}

async fn create_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(payload): ApiJson<StudentPayload>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let input = payload.validate()?;
    let student = ctx.students.create(&input).await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::Create,
        format!("Added student {} ({})", student.nama, student.nim),
    );

    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<StudentPayload>,
) -> AppResult<Json<Student>> {
    let input = payload.validate()?;
    let student = ctx.students.update(id, &input).await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::Update,
        format!("Updated student {} ({})", student.nama, student.nim),
    );

    Ok(Json(student))
}

async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let student = ctx.students.delete(id).await?;

    ctx.activity.record(
        &auth.username,
        ActivityAction::Delete,
        format!("Deleted student {} ({})", student.nama, student.nim),
    );

    Ok(Json(MessageResponse::new("User deleted")))
}
