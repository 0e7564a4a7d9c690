use crate::error::Result;
use crate::models::notification_log::NotificationLog;
use reqwest::Client;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Outbound notifications (Google-Chat-style webhook payloads) queued in
/// Postgres and delivered by a worker loop with capped retry.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    target_url: Option<String>,
}

impl NotificationService {
    pub fn new(pool: PgPool, target_url: Option<String>) -> Self {
        Self {
            pool,
            client: Client::new(),
            target_url,
        }
    }

    /// Queue a notification for delivery. A no-op when no webhook URL is
    /// configured, so a bare deployment still works.
    pub async fn enqueue(
        &self,
        event_type: &str,
        payload: &JsonValue,
    ) -> Result<Option<NotificationLog>> {
        let Some(target_url) = self.target_url.as_deref() else {
            tracing::debug!(event_type, "Reminder webhook not configured; dropping notification");
            return Ok(None);
        };

        let log = sqlx::query_as::<_, NotificationLog>(
            r#"
            INSERT INTO notification_logs (event_type, payload, target_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(event_type)
        .bind(payload)
        .bind(target_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(log))
    }

    async fn deliver_once(&self, log_id: Uuid) -> Result<()> {
        let log = sqlx::query_as::<_, NotificationLog>(
            r#"SELECT * FROM notification_logs WHERE id = $1"#,
        )
        .bind(log_id)
        .fetch_one(&self.pool)
        .await?;

        let res = self.client.post(&log.target_url).json(&log.payload).send().await;
        match res {
            Ok(resp) => {
                let status = resp.status().as_u16() as i32;
                let body = resp.text().await.unwrap_or_default();
                sqlx::query(
                    r#"
                    UPDATE notification_logs
                    SET http_status = $1, response_body = $2,
                        status = CASE WHEN $1 BETWEEN 200 AND 299 THEN 'success' ELSE 'failed' END,
                        attempts = attempts + 1, updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(status)
                .bind(body)
                .bind(log.id)
                .execute(&self.pool)
                .await?;
            }
            Err(err) => {
                sqlx::query(
                    r#"
                    UPDATE notification_logs
                    SET response_body = $1, status = 'failed',
                        attempts = attempts + 1, updated_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(err.to_string())
                .bind(log.id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Deliver at most one queued notification; failed deliveries are
    /// rescheduled with exponential backoff until max_attempts.
    pub async fn run_once(&self) -> Result<bool> {
        let row_opt = sqlx::query(
            r#"SELECT id FROM notification_logs
               WHERE status IN ('pending', 'failed')
                 AND attempts < max_attempts
                 AND (next_retry_at IS NULL OR next_retry_at <= NOW())
               ORDER BY created_at ASC
               FOR UPDATE SKIP LOCKED
               LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row_opt else { return Ok(false) };
        let id: Uuid = row.try_get("id")?;

        if let Err(e) = self.deliver_once(id).await {
            tracing::error!(notification_id = %id, error = %e, "Notification delivery errored");
        }

        sqlx::query(
            r#"
            UPDATE notification_logs
            SET next_retry_at = NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, GREATEST(0, attempts - 1))::int))
            WHERE id = $1 AND status = 'failed' AND attempts < max_attempts
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Daily nudge: users with no attempt in the last week get pinged when
    /// there are quizzes scheduled today or later. Returns how many
    /// reminders were queued.
    pub async fn send_daily_reminders(&self) -> Result<u64> {
        let upcoming_quizzes: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM quizzes WHERE date_of_quiz >= CURRENT_DATE"#,
        )
        .fetch_one(&self.pool)
        .await?;
        if upcoming_quizzes == 0 {
            tracing::info!("No upcoming quizzes; skipping daily reminders");
            return Ok(0);
        }

        let idle_users: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, full_name FROM users u
            WHERE role = 'user' AND is_active AND email_notifications
              AND NOT EXISTS (
                  SELECT 1 FROM scores sc
                  WHERE sc.user_id = u.id
                    AND sc.time_stamp_of_attempt >= NOW() - INTERVAL '7 days'
              )
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut queued = 0u64;
        for (user_id, full_name) in idle_users {
            let payload = serde_json::json!({
                "text": format!(
                    "Hi {}! {} new quizzes are waiting for you on Quiz Master. Keep your streak going!",
                    full_name, upcoming_quizzes
                ),
                "user_id": user_id,
            });
            if self.enqueue("daily_reminder", &payload).await?.is_some() {
                queued += 1;
            }
        }
        tracing::info!(queued, "Daily reminders queued");
        Ok(queued)
    }
}
