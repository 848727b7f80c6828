pub mod prelude;

pub mod schedules;
