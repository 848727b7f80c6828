pub mod credentials;
pub mod orphan_sweeper;
pub mod ownership;
pub mod resource_service;
pub mod schedule_service;
pub mod schedule_store;
pub mod storage;
pub mod upload_service;
