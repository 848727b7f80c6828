mod common;

use common::{PUBLIC_BASE_URL, TestApp, resource, schedule_fixture, setup_test_db};
use serde_json::json;
use study_planner_backend::api::error::AppError;
use study_planner_backend::services::schedule_store::{ScheduleStore, SeaOrmScheduleStore};

#[tokio::test]
async fn test_schedule_crud_lifecycle() {
    let t = TestApp::new().await;

    let (status, created) = t
        .send_json(
            "POST",
            "/api/schedules",
            "U1",
            json!({
                "title": "Linear algebra finals",
                "description": "Chapters 1-6",
                "startDate": "2026-11-01",
                "endDate": "2026-12-15",
            }),
        )
        .await;
    assert_eq!(status, 201, "body: {}", created);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["userId"], "U1");
    assert_eq!(created["status"], "pending");
    assert_eq!(created["resources"], json!([]));

    let (status, listed) = t.get("/api/schedules", "U1").await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) = t.get("/api/schedules", "U2").await;
    assert_eq!(status, 200);
    assert!(listed.as_array().unwrap().is_empty());

    let (status, updated) = t
        .send_json(
            "PUT",
            &format!("/api/schedules/{}", id),
            "U1",
            json!({ "title": "Linear algebra", "status": "completed" }),
        )
        .await;
    assert_eq!(status, 200, "body: {}", updated);
    assert_eq!(updated["title"], "Linear algebra");
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["description"], "Chapters 1-6");

    let (status, _) = t.delete(&format!("/api/schedules/{}", id), "U1").await;
    assert_eq!(status, 200);

    let (status, _) = t.get(&format!("/api/schedules/{}", id), "U1").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_schedule_validation() {
    let t = TestApp::new().await;

    let (status, _) = t
        .send_json(
            "POST",
            "/api/schedules",
            "U1",
            json!({ "title": "", "startDate": "2026-11-01", "endDate": "2026-11-02" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = t
        .send_json(
            "POST",
            "/api/schedules",
            "U1",
            json!({ "title": "Backwards", "startDate": "2026-11-02", "endDate": "2026-11-01" }),
        )
        .await;
    assert_eq!(status, 400);

    t.seed_schedule("S1", "U1").await;
    let (status, _) = t
        .send_json(
            "PUT",
            "/api/schedules/S1",
            "U1",
            json!({ "endDate": "2020-01-01" }),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_schedule_access_is_owner_only() {
    let t = TestApp::new().await;
    t.seed_schedule("S1", "U1").await;

    let (status, _) = t.get("/api/schedules/S1", "U2").await;
    assert_eq!(status, 403);

    let (status, _) = t
        .send_json("PUT", "/api/schedules/S1", "U2", json!({ "title": "Mine now" }))
        .await;
    assert_eq!(status, 403);

    let (status, _) = t.delete("/api/schedules/S1", "U2").await;
    assert_eq!(status, 403);
    assert!(t.schedule("S1").await.is_some());
}

#[tokio::test]
async fn test_schedule_update_leaves_resources_alone() {
    let t = TestApp::new().await;
    let url = format!("{}/U1/S1/1_notes.pdf", PUBLIC_BASE_URL);
    t.seed_schedule_with("S1", "U1", vec![resource("r1", &url)]).await;

    let (status, body) = t
        .send_json(
            "PUT",
            "/api/schedules/S1",
            "U1",
            json!({ "title": "Renamed", "resources": [] }),
        )
        .await;
    assert_eq!(status, 200, "body: {}", body);

    let schedule = t.schedule("S1").await.unwrap();
    assert_eq!(schedule.title, "Renamed");
    assert_eq!(schedule.resources.len(), 1);
    assert_eq!(schedule.revision, 1);
}

#[tokio::test]
async fn test_health_reports_components() {
    let t = TestApp::new().await;

    let (status, body) = t
        .send(
            axum::http::Request::builder()
                .uri("/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["storage"], "configured");
}

#[tokio::test]
async fn test_store_rejects_stale_revision() {
    let t = TestApp::new().await;
    let seeded = t.seed_schedule("S1", "U1").await;

    let mut first = seeded.clone();
    first.title = "First".to_string();
    let stored = t.store.upsert(&first).await.unwrap();
    assert_eq!(stored.revision, 1);

    let mut stale = seeded.clone();
    stale.title = "Stale".to_string();
    let err = t.store.upsert(&stale).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);

    let current = t.schedule("S1").await.unwrap();
    assert_eq!(current.title, "First");
    assert_eq!(current.revision, 1);
}

#[tokio::test]
async fn test_store_scopes_writes_to_owner() {
    let db = setup_test_db().await;
    let store = SeaOrmScheduleStore::new(db);
    let mut schedule = store.create(&schedule_fixture("S1", "U1")).await.unwrap();

    schedule.owner_id = "U2".to_string();
    let err = store.upsert(&schedule).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{:?}", err);
    assert!(!store.delete("S1", "U2").await.unwrap());

    assert!(store.find_by_owner("U2").await.unwrap().is_empty());
    assert_eq!(store.find_by_owner("U1").await.unwrap().len(), 1);
    assert!(store.delete("S1", "U1").await.unwrap());
    assert!(store.find_by_id("S1").await.unwrap().is_none());
}
