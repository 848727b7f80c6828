use crate::api::error::AppError;
use crate::api::handlers::schedules::SuccessResponse;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
};

#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    params(
        ("id" = String, Path, description = "Resource ID")
    ),
    responses(
        (status = 200, description = "Resource removed; blob cleanup is best-effort", body = SuccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resource not found"),
        (status = 409, description = "Concurrent modification")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "resources"
)]
pub async fn delete_resource(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.resources.delete_resource(&claims.sub, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
