/// Grade endpoints (`/nilai`)
use crate::{
    admin::ActivityAction,
    api::{
        middleware::{ApiJson, ApiPath, ApiQuery},
        MessageResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::GradeRow,
    error::AppResult,
    grade::{GradePayload, GradeQuery},
    validation,
};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/nilai", get(list_nilai).post(create_nilai))
        .route(
            "/nilai/:id",
            get(get_nilai).put(update_nilai).delete(delete_nilai),
        )
}

fn describe(row: &GradeRow) -> String {
    format!(
        "Pertemuan {} for {} ({}): {}",
        row.pertemuan, row.nama, row.nim, row.nilai
    )
}

async fn list_nilai(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    ApiQuery(query): ApiQuery<GradeQuery>,
) -> AppResult<Json<Vec<GradeRow>>> {
    let pertemuan = validation::pertemuan_filter(query.pertemuan.as_deref())?;
    Ok(Json(
        ctx.grades.list(query.search.as_deref(), pertemuan).await?,
    ))
}

async fn get_nilai(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<GradeRow>> {
    Ok(Json(ctx.grades.require(id).await?))
}

async fn create_nilai(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(payload): ApiJson<GradePayload>,
) -> AppResult<(StatusCode, Json<GradeRow>)> {
    let input = payload.validate()?;
    let row = ctx.grades.create(&input).await?;

    ctx.activity
        .record(&auth.username, ActivityAction::CreateNilai, describe(&row));

    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_nilai(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<GradePayload>,
) -> AppResult<Json<GradeRow>> {
    let input = payload.validate()?;
    let row = ctx.grades.update(id, &input).await?;

    ctx.activity
        .record(&auth.username, ActivityAction::UpdateNilai, describe(&row));

    Ok(Json(row))
}

async fn delete_nilai(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let row = ctx.grades.delete(id).await?;

    ctx.activity
        .record(&auth.username, ActivityAction::DeleteNilai, describe(&row));

    Ok(Json(MessageResponse::new("Nilai deleted")))
}
