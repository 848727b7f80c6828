#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use study_planner_backend::api::error::AppError;
use study_planner_backend::config::AppConfig;
use study_planner_backend::infrastructure::database;
use study_planner_backend::infrastructure::storage::StorageHandles;
use study_planner_backend::models::{Permission, Resource, Schedule, ScheduleStatus, SignedCredential};
use study_planner_backend::services::credentials::CredentialIssuer;
use study_planner_backend::services::schedule_store::ScheduleStore;
use study_planner_backend::services::storage::{ObjectSummary, StorageService};
use study_planner_backend::utils::auth::create_jwt;
use study_planner_backend::utils::blob_path::BlobLocator;
use study_planner_backend::{AppState, create_app};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "development-secret";
pub const PUBLIC_BASE_URL: &str = "http://storage.test/study-resources";

pub async fn setup_test_db() -> DatabaseConnection {
    // One connection, otherwise every pooled connection sees its own empty in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub fn test_config() -> AppConfig {
    AppConfig::development()
}

pub fn token_for(user_id: &str) -> String {
    create_jwt(user_id, JWT_SECRET, Duration::hours(1)).unwrap()
}

pub fn locator() -> BlobLocator {
    BlobLocator::new(PUBLIC_BASE_URL)
}

/// In-memory object store that records every delete request.
#[derive(Default)]
pub struct MockStorage {
    pub objects: Mutex<HashMap<String, DateTime<Utc>>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn put(&self, key: &str, last_modified: DateTime<Utc>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), last_modified);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn delete_if_exists(&self, key: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(key.to_string());
        if self.fail_deletes {
            return Err(anyhow::anyhow!("storage unavailable"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<ObjectSummary>> {
        let mut objects: Vec<ObjectSummary> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, modified)| ObjectSummary {
                key: key.clone(),
                last_modified: Some(*modified),
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

/// Issues fake signed URLs and remembers what was asked for.
#[derive(Default)]
pub struct RecordingIssuer {
    pub calls: AtomicUsize,
    pub issued: Mutex<Vec<(String, u32, Permission)>>,
}

impl RecordingIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn issued(&self) -> Vec<(String, u32, Permission)> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialIssuer for RecordingIssuer {
    async fn issue(
        &self,
        blob_path: &str,
        ttl_minutes: u32,
        permission: Permission,
    ) -> Result<SignedCredential, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.issued
            .lock()
            .unwrap()
            .push((blob_path.to_string(), ttl_minutes, permission));
        Ok(SignedCredential {
            url: format!(
                "https://signed.test/{}?perm={}&ttl={}",
                blob_path,
                permission.as_str(),
                ttl_minutes
            ),
            blob_path: blob_path.to_string(),
            permission,
            expires_at: Utc::now() + Duration::minutes(i64::from(ttl_minutes)),
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub store: Arc<dyn ScheduleStore>,
    pub storage: Arc<MockStorage>,
    pub issuer: Arc<RecordingIssuer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_storage(MockStorage::new()).await
    }

    pub async fn with_storage(storage: MockStorage) -> Self {
        let db = setup_test_db().await;
        let storage = Arc::new(storage);
        let issuer = Arc::new(RecordingIssuer::new());
        let handles = StorageHandles {
            storage: storage.clone(),
            issuer: issuer.clone(),
            locator: Some(locator()),
        };
        let state = AppState::new(db.clone(), handles, test_config());
        let store = state.store.clone();

        Self {
            app: create_app(state),
            db,
            store,
            storage,
            issuer,
        }
    }

    /// Inserts a schedule with a fixed id straight into the store.
    pub async fn seed_schedule(&self, id: &str, owner_id: &str) -> Schedule {
        self.seed_schedule_with(id, owner_id, Vec::new()).await
    }

    pub async fn seed_schedule_with(
        &self,
        id: &str,
        owner_id: &str,
        resources: Vec<Resource>,
    ) -> Schedule {
        let mut schedule = schedule_fixture(id, owner_id);
        schedule.resources = resources;
        self.store.create(&schedule).await.unwrap()
    }

    pub async fn schedule(&self, id: &str) -> Option<Schedule> {
        self.store.find_by_id(id).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (u16, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }

    pub async fn get(&self, uri: &str, user: &str) -> (u16, Value) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token_for(user)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> (u16, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token_for(user)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, user: &str, body: Value) -> (u16, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token_for(user)))
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn read_json(response: Response<Body>) -> (u16, Value) {
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn schedule_fixture(id: &str, owner_id: &str) -> Schedule {
    let now = Utc::now();
    Schedule {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        title: format!("Schedule {}", id),
        description: String::new(),
        start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
        status: ScheduleStatus::Pending,
        resources: Vec::new(),
        revision: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn resource(id: &str, file_url: &str) -> Resource {
    Resource {
        id: id.to_string(),
        file_name: format!("{}.pdf", id),
        file_url: file_url.to_string(),
        file_size: 1024,
        file_type: "application/pdf".to_string(),
        uploaded_at: Utc::now(),
    }
}
