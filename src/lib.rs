pub mod client;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    catalog_service::CatalogService, export_queue_service::ExportQueueService,
    notification_service::NotificationService, quiz_service::QuizService,
    reporting_service::ReportingService, scoring_service::ScoringService,
    user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub quiz_service: QuizService,
    pub scoring_service: ScoringService,
    pub reporting_service: ReportingService,
    pub export_queue_service: ExportQueueService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let user_service = UserService::new(pool.clone());
        let catalog_service = CatalogService::new(pool.clone());
        let quiz_service = QuizService::new(pool.clone());
        let scoring_service = ScoringService::new(pool.clone());
        let reporting_service = ReportingService::new(pool.clone());
        let export_queue_service = ExportQueueService::new(pool.clone());
        let notification_service =
            NotificationService::new(pool.clone(), config.reminder_webhook_url.clone());

        Self {
            pool,
            user_service,
            catalog_service,
            quiz_service,
            scoring_service,
            reporting_service,
            export_queue_service,
            notification_service,
        }
    }
}
