pub use super::schedules::Entity as Schedules;
