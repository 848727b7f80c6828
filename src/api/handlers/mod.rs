pub mod health;
pub mod resources;
pub mod schedules;
pub mod upload;
