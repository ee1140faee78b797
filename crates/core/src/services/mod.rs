pub mod activity_service;
pub mod admin_service;
pub mod auth_service;
pub mod prediction_service;
pub mod trend_aggregator;
