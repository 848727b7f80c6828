use crate::api::error::AppError;
use crate::models::Schedule;
use crate::services::schedule_store::ScheduleStore;

/// The single authorization rule: a schedule and everything in it belongs to its owner.
/// Existence is not hidden; a missing schedule is `NotFound`, a foreign one `Forbidden`.
pub fn assert_ownership(schedule: Option<Schedule>, caller_id: &str) -> Result<Schedule, AppError> {
    let schedule = schedule.ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;
    if schedule.owner_id != caller_id {
        tracing::warn!(
            schedule_id = %schedule.id,
            caller = %caller_id,
            "Rejected access to a schedule owned by another user"
        );
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(schedule)
}

pub async fn load_owned_schedule(
    store: &dyn ScheduleStore,
    schedule_id: &str,
    caller_id: &str,
) -> Result<Schedule, AppError> {
    assert_ownership(store.find_by_id(schedule_id).await?, caller_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleStatus;
    use chrono::{NaiveDate, Utc};

    fn schedule(owner: &str) -> Schedule {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        Schedule {
            id: "S1".into(),
            owner_id: owner.into(),
            title: "Exam prep".into(),
            description: String::new(),
            start_date: date,
            end_date: date,
            status: ScheduleStatus::Pending,
            resources: Vec::new(),
            revision: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_passes() {
        let s = assert_ownership(Some(schedule("U1")), "U1").unwrap();
        assert_eq!(s.id, "S1");
    }

    #[test]
    fn test_other_user_is_forbidden() {
        assert!(matches!(
            assert_ownership(Some(schedule("U1")), "U2"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_is_not_found() {
        assert!(matches!(
            assert_ownership(None, "U1"),
            Err(AppError::NotFound(_))
        ));
    }
}
