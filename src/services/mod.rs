pub mod catalog_service;
pub mod export_queue_service;
pub mod export_service;
pub mod notification_service;
pub mod quiz_service;
pub mod reporting_service;
pub mod scoring_service;
pub mod user_service;
