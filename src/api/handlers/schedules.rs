use crate::api::error::AppError;
use crate::models::Schedule;
use crate::services::schedule_service::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[utoipa::path(
    get,
    path = "/api/schedules",
    responses(
        (status = 200, description = "Schedules of the caller", body = Vec<Schedule>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "schedules"
)]
pub async fn list_schedules(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Schedule>>, AppError> {
    Ok(Json(state.schedules.list(&claims.sub).await?))
}

#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = Schedule),
        (status = 400, description = "Invalid schedule"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "schedules"
)]
pub async fn create_schedule(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    let Json(req) = payload?;
    let schedule = state.schedules.create(&claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[utoipa::path(
    get,
    path = "/api/schedules/{id}",
    params(
        ("id" = String, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule", body = Schedule),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Schedule not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "schedules"
)]
pub async fn get_schedule(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, AppError> {
    Ok(Json(state.schedules.get(&claims.sub, &id).await?))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}",
    params(
        ("id" = String, Path, description = "Schedule ID")
    ),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = Schedule),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Concurrent modification")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "schedules"
)]
pub async fn update_schedule(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateScheduleRequest>, JsonRejection>,
) -> Result<Json<Schedule>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.schedules.update(&claims.sub, &id, req).await?))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(
        ("id" = String, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Schedule not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "schedules"
)]
pub async fn delete_schedule(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.schedules.delete(&claims.sub, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
