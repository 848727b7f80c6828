pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::config::AppConfig;
use crate::infrastructure::storage::StorageHandles;
use crate::services::resource_service::ResourceService;
use crate::services::schedule_service::ScheduleService;
use crate::services::schedule_store::{ScheduleStore, SeaOrmScheduleStore};
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::schedules::list_schedules,
        handlers::schedules::create_schedule,
        handlers::schedules::get_schedule,
        handlers::schedules::update_schedule,
        handlers::schedules::delete_schedule,
        handlers::upload::request_upload_credential,
        handlers::upload::finish_upload,
        handlers::upload::request_read_credential,
        handlers::resources::delete_resource,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::schedules::SuccessResponse,
            services::schedule_service::CreateScheduleRequest,
            services::schedule_service::UpdateScheduleRequest,
            services::upload_service::UploadCredentialResponse,
            services::upload_service::FinalizeUploadRequest,
            services::upload_service::FinalizeUploadResponse,
            services::resource_service::ReadCredentialResponse,
            models::Schedule,
            models::ScheduleStatus,
            models::Resource,
        )
    ),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "schedules", description = "Study schedule management"),
        (name = "upload", description = "Signed upload and read credentials"),
        (name = "resources", description = "Resource attachments")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: Arc<dyn ScheduleStore>,
    pub schedules: Arc<ScheduleService>,
    pub uploads: Arc<UploadService>,
    pub resources: Arc<ResourceService>,
    pub storage: Arc<dyn StorageService>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services over one shared schedule store.
    pub fn new(db: DatabaseConnection, storage: StorageHandles, config: AppConfig) -> Self {
        let store: Arc<dyn ScheduleStore> = Arc::new(SeaOrmScheduleStore::new(db.clone()));

        let schedules = Arc::new(ScheduleService::new(store.clone(), config.clone()));
        let uploads = Arc::new(UploadService::new(
            store.clone(),
            storage.issuer.clone(),
            storage.locator.clone(),
            config.clone(),
        ));
        let resources = Arc::new(ResourceService::new(
            store.clone(),
            storage.storage.clone(),
            storage.issuer.clone(),
            storage.locator.clone(),
            config.clone(),
        ));

        Self {
            db,
            store,
            schedules,
            uploads,
            resources,
            storage: storage.storage,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route(
            "/api/schedules",
            get(handlers::schedules::list_schedules).post(handlers::schedules::create_schedule),
        )
        .route(
            "/api/schedules/:id",
            get(handlers::schedules::get_schedule)
                .put(handlers::schedules::update_schedule)
                .delete(handlers::schedules::delete_schedule),
        )
        .route(
            "/api/upload/credential",
            get(handlers::upload::request_upload_credential),
        )
        .route("/api/upload/finish", post(handlers::upload::finish_upload))
        .route(
            "/api/upload/read-credential",
            get(handlers::upload::request_read_credential),
        )
        .route(
            "/api/resources/:id",
            delete(handlers::resources::delete_resource),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .merge(protected)
        .layer(from_fn(
            api::middleware::request_context::request_context_middleware,
        ))
        .layer(cors)
        .with_state(state)
}
