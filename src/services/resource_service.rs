use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{Permission, Resource, Schedule};
use crate::services::credentials::CredentialIssuer;
use crate::services::ownership::load_owned_schedule;
use crate::services::schedule_store::ScheduleStore;
use crate::services::storage::StorageService;
use crate::utils::blob_path::BlobLocator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadCredentialResponse {
    pub signed_read_url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ResourceService {
    store: Arc<dyn ScheduleStore>,
    storage: Arc<dyn StorageService>,
    issuer: Arc<dyn CredentialIssuer>,
    locator: Option<BlobLocator>,
    config: AppConfig,
}

impl ResourceService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        storage: Arc<dyn StorageService>,
        issuer: Arc<dyn CredentialIssuer>,
        locator: Option<BlobLocator>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            storage,
            issuer,
            locator,
            config,
        }
    }

    /// Finds the caller's schedule holding `resource_id`. Only the caller's
    /// partition is searched.
    async fn locate(
        &self,
        owner_id: &str,
        resource_id: &str,
    ) -> Result<(Schedule, Resource), AppError> {
        self.store
            .find_by_owner(owner_id)
            .await?
            .into_iter()
            .find_map(|schedule| {
                let resource = schedule.find_resource(resource_id)?.clone();
                Some((schedule, resource))
            })
            .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))
    }

    /// Storage cleanup never fails the deletion: a leaked blob is harmless, a
    /// record pointing at a missing blob is not.
    async fn delete_blob_best_effort(&self, resource: &Resource) {
        let Some(blob_path) = self
            .locator
            .as_ref()
            .and_then(|locator| locator.path_for(&resource.file_url))
        else {
            tracing::debug!(
                resource_id = %resource.id,
                "Resource URL is outside the managed store, skipping blob delete"
            );
            return;
        };

        if let Err(e) = self.storage.delete_if_exists(&blob_path).await {
            tracing::warn!(
                resource_id = %resource.id,
                blob_path = %blob_path,
                "Blob delete failed, resource record already removed: {}",
                e
            );
        }
    }

    pub async fn delete_resource(&self, owner_id: &str, resource_id: &str) -> Result<(), AppError> {
        let (mut schedule, resource) = self.locate(owner_id, resource_id).await?;

        let mut attempt = 1;
        let removed_here = loop {
            schedule.resources.retain(|r| r.id != resource_id);
            schedule.updated_at = Utc::now();

            match self.store.upsert(&schedule).await {
                Ok(stored) => {
                    schedule = stored;
                    break true;
                }
                Err(AppError::Conflict(msg)) if attempt < self.config.max_write_attempts => {
                    tracing::warn!("Retrying resource delete (attempt {}): {}", attempt, msg);
                    attempt += 1;
                    schedule = load_owned_schedule(self.store.as_ref(), &schedule.id, owner_id)
                        .await?;
                    if schedule.find_resource(resource_id).is_none() {
                        // removed by a concurrent request, which also owns the blob cleanup
                        break false;
                    }
                }
                Err(e) => return Err(e),
            }
        };

        // Blob goes only after the record is gone, and only if no sibling record shares it
        let shared = schedule
            .resources
            .iter()
            .any(|r| r.file_url == resource.file_url);
        if removed_here && !shared {
            self.delete_blob_best_effort(&resource).await;
        } else if shared {
            tracing::debug!(
                resource_id = %resource_id,
                "Blob still referenced by another resource, keeping it"
            );
        }

        tracing::info!(
            owner = %owner_id,
            schedule_id = %schedule.id,
            resource_id = %resource_id,
            "🗑️  Resource deleted"
        );
        Ok(())
    }

    pub async fn issue_read_credential(
        &self,
        owner_id: &str,
        schedule_id: &str,
        file_url: &str,
    ) -> Result<ReadCredentialResponse, AppError> {
        let schedule = load_owned_schedule(self.store.as_ref(), schedule_id, owner_id).await?;

        if !schedule.resources.iter().any(|r| r.file_url == file_url) {
            return Err(AppError::NotFound("Resource not found".to_string()));
        }

        let blob_path = self
            .locator
            .as_ref()
            .ok_or_else(|| {
                AppError::Configuration("file storage location is not configured".to_string())
            })?
            .path_for(file_url)
            .ok_or_else(|| AppError::BadRequest("Invalid fileUrl".to_string()))?;

        let credential = self
            .issuer
            .issue(&blob_path, self.config.read_ttl_minutes, Permission::Read)
            .await?;

        tracing::info!(
            owner = %owner_id,
            schedule_id = %schedule.id,
            blob_path = %blob_path,
            "🔑 Read credential issued"
        );

        Ok(ReadCredentialResponse {
            signed_read_url: credential.url,
            expires_at: credential.expires_at,
        })
    }
}
