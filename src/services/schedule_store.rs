use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::{Resource, Schedule, ScheduleStatus};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Document store for schedules, partitioned by owner.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Schedule>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>, AppError>;
    async fn create(&self, schedule: &Schedule) -> Result<Schedule, AppError>;
    /// Replaces the whole document if its revision still matches `schedule.revision`.
    /// Returns the stored document with the bumped revision, `Conflict` if another
    /// write got there first, `NotFound` if the document is gone.
    async fn upsert(&self, schedule: &Schedule) -> Result<Schedule, AppError>;
    /// Deletes by id within the owner's partition. Returns whether a document was removed.
    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool, AppError>;
    async fn ping(&self) -> Result<(), AppError>;
}

pub struct SeaOrmScheduleStore {
    db: DatabaseConnection,
}

impl SeaOrmScheduleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: schedules::Model) -> Result<Schedule, AppError> {
    let status = ScheduleStatus::parse(&model.status).ok_or_else(|| {
        AppError::Internal(format!(
            "schedule {} has unknown status {:?}",
            model.id, model.status
        ))
    })?;
    let resources: Vec<Resource> = if model.resources.is_null() {
        Vec::new()
    } else {
        serde_json::from_value(model.resources).map_err(|e| {
            AppError::Internal(format!("schedule {} has malformed resources: {}", model.id, e))
        })?
    };

    Ok(Schedule {
        id: model.id,
        owner_id: model.owner_id,
        title: model.title,
        description: model.description,
        start_date: model.start_date,
        end_date: model.end_date,
        status,
        resources,
        revision: model.revision,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn resources_json(schedule: &Schedule) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(&schedule.resources)
        .map_err(|e| AppError::Internal(format!("failed to encode resources: {}", e)))
}

#[async_trait]
impl ScheduleStore for SeaOrmScheduleStore {
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Schedule>, AppError> {
        Schedules::find()
            .filter(schedules::Column::OwnerId.eq(owner_id))
            .order_by_asc(schedules::Column::StartDate)
            .order_by_asc(schedules::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>, AppError> {
        Schedules::find_by_id(id)
            .one(&self.db)
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn create(&self, schedule: &Schedule) -> Result<Schedule, AppError> {
        let active = schedules::ActiveModel {
            id: Set(schedule.id.clone()),
            owner_id: Set(schedule.owner_id.clone()),
            title: Set(schedule.title.clone()),
            description: Set(schedule.description.clone()),
            start_date: Set(schedule.start_date),
            end_date: Set(schedule.end_date),
            status: Set(schedule.status.as_str().to_string()),
            resources: Set(resources_json(schedule)?),
            revision: Set(schedule.revision),
            created_at: Set(schedule.created_at),
            updated_at: Set(schedule.updated_at),
        };

        let model = active.insert(&self.db).await?;
        to_domain(model)
    }

    async fn upsert(&self, schedule: &Schedule) -> Result<Schedule, AppError> {
        let next_revision = schedule.revision + 1;
        let changes = schedules::ActiveModel {
            title: Set(schedule.title.clone()),
            description: Set(schedule.description.clone()),
            start_date: Set(schedule.start_date),
            end_date: Set(schedule.end_date),
            status: Set(schedule.status.as_str().to_string()),
            resources: Set(resources_json(schedule)?),
            revision: Set(next_revision),
            updated_at: Set(schedule.updated_at),
            ..Default::default()
        };

        let result = Schedules::update_many()
            .set(changes)
            .filter(schedules::Column::Id.eq(&schedule.id))
            .filter(schedules::Column::OwnerId.eq(&schedule.owner_id))
            .filter(schedules::Column::Revision.eq(schedule.revision))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let current = Schedules::find_by_id(&schedule.id)
                .filter(schedules::Column::OwnerId.eq(&schedule.owner_id))
                .one(&self.db)
                .await?;
            return Err(match current {
                None => AppError::NotFound("Schedule not found".to_string()),
                Some(current) => AppError::Conflict(format!(
                    "Schedule {} was modified concurrently (revision {} is now {})",
                    schedule.id, schedule.revision, current.revision
                )),
            });
        }

        let mut stored = schedule.clone();
        stored.revision = next_revision;
        Ok(stored)
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool, AppError> {
        let result = Schedules::delete_many()
            .filter(schedules::Column::Id.eq(id))
            .filter(schedules::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.db.ping().await?;
        Ok(())
    }
}
