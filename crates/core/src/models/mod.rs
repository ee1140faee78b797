pub mod activity;
pub mod database;
pub mod prediction;
pub mod report;
pub mod settings;
pub mod trend;
pub mod user;
