pub mod auth;
pub mod blob_path;
