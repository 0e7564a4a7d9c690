use crate::error::{Error, Result};
use crate::models::export_job::ExportJob;
use crate::services::export_service::ExportService;
use crate::utils::token::generate_file_key;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub const KIND_USER_SCORES: &str = "user_scores";
pub const KIND_ALL_SCORES: &str = "all_scores";
pub const KIND_MONTHLY_REPORTS: &str = "monthly_reports";

/// Postgres-backed export job queue. Jobs are enqueued by the export
/// routes, claimed by the worker loop with SKIP LOCKED, and leave a CSV
/// artifact in the export directory on success.
#[derive(Clone)]
pub struct ExportQueueService {
    pub pool: PgPool,
}

impl ExportQueueService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, kind: &str, requested_by: Option<i64>) -> Result<Uuid> {
        let row = sqlx::query(
            r#"INSERT INTO export_jobs (kind, requested_by) VALUES ($1, $2) RETURNING id"#,
        )
        .bind(kind)
        .bind(requested_by)
        .fetch_one(&self.pool)
        .await?;
        let id: Uuid = row.try_get("id")?;
        tracing::info!(job_id = %id, kind, "Export job enqueued");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<ExportJob> {
        let job = sqlx::query_as::<_, ExportJob>(r#"SELECT * FROM export_jobs WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Export task not found".to_string()))?;
        Ok(job)
    }

    /// Claim and run at most one pending job. Returns whether a job was
    /// processed, so the worker loop can idle when the queue is empty.
    pub async fn run_once(&self, app_state: &crate::AppState) -> Result<bool> {
        let rec = sqlx::query(
            r#"
            UPDATE export_jobs SET status = 'running', started_at = NOW()
            WHERE id = (
                SELECT id FROM export_jobs WHERE status = 'pending'
                ORDER BY created_at ASC FOR UPDATE SKIP LOCKED LIMIT 1
            )
            RETURNING id, kind, requested_by
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = rec else { return Ok(false) };
        let job_id: Uuid = row.try_get("id")?;
        let kind: String = row.try_get("kind")?;
        let requested_by: Option<i64> = row.try_get("requested_by")?;

        let result = self.execute(app_state, &kind, requested_by).await;
        match result {
            Ok(file_key) => {
                sqlx::query(
                    r#"UPDATE export_jobs SET status = 'completed', file_key = $1, finished_at = NOW() WHERE id = $2"#,
                )
                .bind(&file_key)
                .bind(job_id)
                .execute(&self.pool)
                .await?;
                tracing::info!(job_id = %job_id, kind, file_key, "Export job completed");
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, kind, error = %e, "Export job failed");
                sqlx::query(
                    r#"UPDATE export_jobs SET status = 'failed', error = $1, finished_at = NOW() WHERE id = $2"#,
                )
                .bind(e.to_string())
                .bind(job_id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(true)
    }

    async fn execute(
        &self,
        app_state: &crate::AppState,
        kind: &str,
        requested_by: Option<i64>,
    ) -> Result<Option<String>> {
        match kind {
            KIND_USER_SCORES => {
                let user_id = requested_by.ok_or_else(|| {
                    Error::Internal("user_scores job without a requesting user".to_string())
                })?;
                let report = app_state.reporting_service.build_user_report(user_id).await?;
                let csv = ExportService::render_user_report_csv(&report)?;
                let file_key = generate_file_key(&format!("user_quiz_data_{}", user_id));
                self.write_artifact(&file_key, "csv", csv.as_bytes()).await?;
                Ok(Some(file_key))
            }
            KIND_ALL_SCORES => {
                let rows = app_state.reporting_service.user_export_rows().await?;
                let csv = ExportService::render_admin_export_csv(&rows)?;
                let file_key = generate_file_key("admin_quiz_data");
                self.write_artifact(&file_key, "csv", csv.as_bytes()).await?;
                Ok(Some(file_key))
            }
            KIND_MONTHLY_REPORTS => {
                self.generate_monthly_reports(app_state).await?;
                Ok(None)
            }
            other => Err(Error::Internal(format!("Unknown export job kind '{}'", other))),
        }
    }

    /// Render every opted-in user's report in their preferred format and
    /// notify them that it is ready.
    async fn generate_monthly_reports(&self, app_state: &crate::AppState) -> Result<()> {
        let month = Utc::now().format("%Y%m").to_string();
        let users: Vec<(i64, String)> = sqlx::query_as(
            r#"SELECT id, report_format FROM users
               WHERE role = 'user' AND is_active AND email_notifications"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut generated = 0usize;
        for (user_id, report_format) in users {
            let report = match app_state.reporting_service.build_user_report(user_id).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Skipping monthly report");
                    continue;
                }
            };

            let (ext, body) = if report_format == "csv" {
                ("csv", ExportService::render_user_report_csv(&report)?)
            } else {
                ("html", ExportService::render_user_report_html(&report))
            };
            let name = format!("monthly_{}_{}", user_id, month);
            self.write_artifact(&name, ext, body.as_bytes()).await?;
            generated += 1;

            let payload = serde_json::json!({
                "text": format!(
                    "Your Quiz Master report for {} is ready ({} quizzes, {}% average).",
                    month, report.stats.total_quizzes, report.stats.average_score
                ),
                "user_id": user_id,
                "month": month,
            });
            if let Err(e) = app_state
                .notification_service
                .enqueue("monthly_report_ready", &payload)
                .await
            {
                tracing::error!(user_id, error = %e, "Failed to enqueue report notification");
            }
        }
        tracing::info!(month, generated, "Monthly reports generated");
        Ok(())
    }

    async fn write_artifact(&self, file_key: &str, ext: &str, bytes: &[u8]) -> Result<()> {
        let dir = &crate::config::get_config().export_dir;
        tokio::fs::create_dir_all(dir).await?;
        let path = format!("{}/{}.{}", dir, file_key, ext);
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }
}
