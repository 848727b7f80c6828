use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{Permission, Resource};
use crate::services::credentials::CredentialIssuer;
use crate::services::ownership::load_owned_schedule;
use crate::services::schedule_store::ScheduleStore;
use crate::utils::blob_path::{BlobClock, BlobLocator, derive_blob_path, schedule_prefix};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredentialResponse {
    /// Presigned PUT URL for the direct upload
    pub signed_upload_url: String,
    /// Public URL of the blob once uploaded; pass it to the finalize call
    pub resulting_file_url: String,
    pub blob_path: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeUploadRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "scheduleId is required"))]
    pub schedule_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "fileName must be between 1 and 255 characters"))]
    pub file_name: String,
    #[validate(range(min = 0, message = "fileSize must not be negative"))]
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "fileUrl is required"))]
    pub file_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct FinalizeUploadResponse {
    pub success: bool,
    pub resource: Resource,
}

/// Coordinates the three-phase upload: credential request, the client's direct
/// transfer (not observed here), and finalize. Finalize is the only writer of
/// resource records and is deliberately not idempotent.
pub struct UploadService {
    store: Arc<dyn ScheduleStore>,
    issuer: Arc<dyn CredentialIssuer>,
    locator: Option<BlobLocator>,
    clock: BlobClock,
    config: AppConfig,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        issuer: Arc<dyn CredentialIssuer>,
        locator: Option<BlobLocator>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            issuer,
            locator,
            clock: BlobClock::new(),
            config,
        }
    }

    fn locator(&self) -> Result<&BlobLocator, AppError> {
        self.locator.as_ref().ok_or_else(|| {
            AppError::Configuration("file storage location is not configured".to_string())
        })
    }

    pub async fn request_upload(
        &self,
        owner_id: &str,
        file_name: &str,
        schedule_id: &str,
    ) -> Result<UploadCredentialResponse, AppError> {
        let schedule = load_owned_schedule(self.store.as_ref(), schedule_id, owner_id).await?;
        let locator = self.locator()?;

        let blob_path = derive_blob_path(
            &schedule.owner_id,
            &schedule.id,
            self.clock.next_millis(),
            file_name,
        );

        let credential = self
            .issuer
            .issue(&blob_path, self.config.upload_ttl_minutes, Permission::ReadWrite)
            .await?;

        tracing::info!(
            owner = %owner_id,
            schedule_id = %schedule.id,
            blob_path = %blob_path,
            expires_at = %credential.expires_at,
            "🔑 Upload credential issued"
        );

        Ok(UploadCredentialResponse {
            signed_upload_url: credential.url,
            resulting_file_url: locator.url_for(&blob_path),
            blob_path,
            expires_at: credential.expires_at,
        })
    }

    pub async fn finalize(
        &self,
        owner_id: &str,
        req: FinalizeUploadRequest,
    ) -> Result<Resource, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut schedule =
            load_owned_schedule(self.store.as_ref(), &req.schedule_id, owner_id).await?;

        let blob_path = self
            .locator()?
            .path_for(&req.file_url)
            .ok_or_else(|| AppError::BadRequest("Invalid fileUrl".to_string()))?;
        if !blob_path.starts_with(&schedule_prefix(owner_id, &schedule.id)) {
            return Err(AppError::BadRequest(
                "fileUrl does not belong to this schedule's uploads".to_string(),
            ));
        }

        let resource = Resource {
            id: Uuid::new_v4().to_string(),
            file_name: req.file_name,
            file_url: req.file_url,
            file_size: req.file_size.unwrap_or(0),
            file_type: req
                .file_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
            uploaded_at: Utc::now(),
        };

        let mut attempt = 1;
        loop {
            schedule.resources.push(resource.clone());
            schedule.updated_at = Utc::now();

            match self.store.upsert(&schedule).await {
                Ok(stored) => {
                    tracing::info!(
                        owner = %owner_id,
                        schedule_id = %stored.id,
                        resource_id = %resource.id,
                        blob_path = %blob_path,
                        "📎 Resource attached"
                    );
                    return Ok(resource);
                }
                Err(AppError::Conflict(msg)) if attempt < self.config.max_write_attempts => {
                    tracing::warn!("Retrying finalize (attempt {}): {}", attempt, msg);
                    attempt += 1;
                    schedule =
                        load_owned_schedule(self.store.as_ref(), &req.schedule_id, owner_id)
                            .await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
