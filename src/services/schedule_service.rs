use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{Schedule, ScheduleStatus};
use crate::services::ownership::load_owned_schedule;
use crate::services::schedule_store::ScheduleStore;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_new_range"))]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<ScheduleStatus>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ScheduleStatus>,
}

fn validate_new_range(req: &CreateScheduleRequest) -> Result<(), ValidationError> {
    check_range(req.start_date, req.end_date)
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        let mut err = ValidationError::new("date_range");
        err.message = Some("endDate must not be before startDate".into());
        return Err(err);
    }
    Ok(())
}

/// Plain document CRUD. Resources are not writable here; they only change
/// through the upload and resource flows.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    config: AppConfig,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Schedule>, AppError> {
        self.store.find_by_owner(owner_id).await
    }

    pub async fn create(
        &self,
        owner_id: &str,
        req: CreateScheduleRequest,
    ) -> Result<Schedule, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status.unwrap_or_default(),
            resources: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(&schedule).await?;
        tracing::info!(owner = %owner_id, schedule_id = %created.id, "Schedule created");
        Ok(created)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Schedule, AppError> {
        load_owned_schedule(self.store.as_ref(), id, owner_id).await
    }

    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        req: UpdateScheduleRequest,
    ) -> Result<Schedule, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut attempt = 1;
        loop {
            let mut schedule = load_owned_schedule(self.store.as_ref(), id, owner_id).await?;

            if let Some(title) = &req.title {
                schedule.title = title.clone();
            }
            if let Some(description) = &req.description {
                schedule.description = description.clone();
            }
            if let Some(start_date) = req.start_date {
                schedule.start_date = start_date;
            }
            if let Some(end_date) = req.end_date {
                schedule.end_date = end_date;
            }
            if let Some(status) = req.status {
                schedule.status = status;
            }
            check_range(schedule.start_date, schedule.end_date)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            schedule.updated_at = Utc::now();

            match self.store.upsert(&schedule).await {
                Ok(stored) => return Ok(stored),
                Err(AppError::Conflict(msg)) if attempt < self.config.max_write_attempts => {
                    tracing::warn!("Retrying schedule update (attempt {}): {}", attempt, msg);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<(), AppError> {
        load_owned_schedule(self.store.as_ref(), id, owner_id).await?;
        if !self.store.delete(id, owner_id).await? {
            return Err(AppError::NotFound("Schedule not found".to_string()));
        }
        tracing::info!(owner = %owner_id, schedule_id = %id, "Schedule deleted");
        Ok(())
    }
}
