use crate::config::AppConfig;
use crate::models::Schedule;
use crate::services::schedule_store::ScheduleStore;
use crate::services::storage::StorageService;
use crate::utils::blob_path::{BlobLocator, split_blob_path};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Removes blobs whose upload was never finalized. A blob is only touched once
/// it is older than the grace period, so uploads still between transfer and
/// finalize survive.
pub struct OrphanSweeper {
    store: Arc<dyn ScheduleStore>,
    storage: Arc<dyn StorageService>,
    locator: Option<BlobLocator>,
    config: AppConfig,
    shutdown: watch::Receiver<bool>,
}

impl OrphanSweeper {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        storage: Arc<dyn StorageService>,
        locator: Option<BlobLocator>,
        config: AppConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            storage,
            locator,
            config,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        if !self.storage.is_configured() || self.locator.is_none() {
            tracing::warn!("🧹 Orphan sweeper disabled: file storage is not configured");
            return;
        }

        tracing::info!(
            "🚀 Orphan sweeper started (interval {}s, grace {}h)",
            self.config.orphan_sweep_interval_secs,
            self.config.orphan_grace_hours
        );

        let interval = std::time::Duration::from_secs(self.config.orphan_sweep_interval_secs);
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Orphan sweeper shutting down");
                    break;
                }
                _ = sleep(interval) => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(report) => tracing::info!(
                            "✅ Orphan sweep completed: scanned={}, deleted={}, kept={}, failed={}",
                            report.scanned, report.deleted, report.kept, report.failed
                        ),
                        Err(e) => tracing::error!("Orphan sweep failed: {:?}", e),
                    }
                }
            }
        }
    }

    pub async fn sweep_once(&self, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
        let Some(locator) = &self.locator else {
            return Ok(SweepReport::default());
        };
        let cutoff = now - Duration::hours(self.config.orphan_grace_hours);
        let objects = self.storage.list_objects("").await?;

        let mut report = SweepReport::default();
        // schedule id -> (owner, blob paths its resources point at); None when the schedule is gone
        let mut tracked: HashMap<String, Option<(String, HashSet<String>)>> = HashMap::new();

        for object in objects {
            report.scanned += 1;

            let Some((owner, schedule_id, _)) = split_blob_path(&object.key) else {
                report.kept += 1;
                continue;
            };
            if object.last_modified.is_none_or(|modified| modified > cutoff) {
                report.kept += 1;
                continue;
            }

            if !tracked.contains_key(schedule_id) {
                let schedule = self.store.find_by_id(schedule_id).await?;
                tracked.insert(
                    schedule_id.to_string(),
                    schedule.map(|s| (s.owner_id.clone(), referenced_paths(&s, locator))),
                );
            }
            let referenced = tracked
                .get(schedule_id)
                .and_then(|entry| entry.as_ref())
                .is_some_and(|(schedule_owner, paths)| {
                    schedule_owner == owner && paths.contains(&object.key)
                });

            if referenced {
                report.kept += 1;
                continue;
            }

            match self.storage.delete_if_exists(&object.key).await {
                Ok(()) => {
                    tracing::info!(blob_path = %object.key, "Deleted orphaned blob");
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!(blob_path = %object.key, "Failed to delete orphaned blob: {}", e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn referenced_paths(schedule: &Schedule, locator: &BlobLocator) -> HashSet<String> {
    schedule
        .resources
        .iter()
        .filter_map(|r| locator.path_for(&r.file_url))
        .collect()
}
