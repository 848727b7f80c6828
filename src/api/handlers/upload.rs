use crate::api::error::AppError;
use crate::services::resource_service::ReadCredentialResponse;
use crate::services::upload_service::{
    FinalizeUploadRequest, FinalizeUploadResponse, UploadCredentialResponse,
};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadCredentialQuery {
    pub file_name: Option<String>,
    pub schedule_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReadCredentialQuery {
    pub file_url: Option<String>,
    pub schedule_id: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[utoipa::path(
    get,
    path = "/api/upload/credential",
    params(UploadCredentialQuery),
    responses(
        (status = 200, description = "Signed upload URL issued", body = UploadCredentialResponse),
        (status = 400, description = "fileName and scheduleId are required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of the schedule"),
        (status = 404, description = "Schedule not found"),
        (status = 503, description = "File storage not configured")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "upload"
)]
pub async fn request_upload_credential(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UploadCredentialQuery>,
) -> Result<Json<UploadCredentialResponse>, AppError> {
    let (Some(file_name), Some(schedule_id)) =
        (required(query.file_name), required(query.schedule_id))
    else {
        return Err(AppError::BadRequest(
            "fileName and scheduleId are required".to_string(),
        ));
    };

    let response = state
        .uploads
        .request_upload(&claims.sub, &file_name, &schedule_id)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/upload/finish",
    request_body = FinalizeUploadRequest,
    responses(
        (status = 200, description = "Resource recorded", body = FinalizeUploadResponse),
        (status = 400, description = "Malformed body or missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of the schedule"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Concurrent modification")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "upload"
)]
pub async fn finish_upload(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<FinalizeUploadRequest>, JsonRejection>,
) -> Result<Json<FinalizeUploadResponse>, AppError> {
    let Json(req) = payload?;
    let resource = state.uploads.finalize(&claims.sub, req).await?;
    Ok(Json(FinalizeUploadResponse {
        success: true,
        resource,
    }))
}

#[utoipa::path(
    get,
    path = "/api/upload/read-credential",
    params(ReadCredentialQuery),
    responses(
        (status = 200, description = "Signed read URL issued", body = ReadCredentialResponse),
        (status = 400, description = "fileUrl and scheduleId are required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of the schedule"),
        (status = 404, description = "Schedule or resource not found"),
        (status = 503, description = "File storage not configured")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "upload"
)]
pub async fn request_read_credential(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ReadCredentialQuery>,
) -> Result<Json<ReadCredentialResponse>, AppError> {
    let (Some(file_url), Some(schedule_id)) =
        (required(query.file_url), required(query.schedule_id))
    else {
        return Err(AppError::BadRequest(
            "fileUrl and scheduleId are required".to_string(),
        ));
    };

    let response = state
        .resources
        .issue_read_credential(&claims.sub, &schedule_id, &file_url)
        .await?;
    Ok(Json(response))
}
