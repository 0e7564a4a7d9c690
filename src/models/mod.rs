pub mod chapter;
pub mod export_job;
pub mod notification_log;
pub mod question;
pub mod quiz;
pub mod score;
pub mod subject;
pub mod user;
