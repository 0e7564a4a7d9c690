use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// One persisted attempt joined with its place in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScoreDetail {
    pub score_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub quiz_id: i64,
    pub date_of_quiz: NaiveDate,
    pub chapter_name: String,
    pub subject_name: String,
    pub total_scored: f64,
    pub time_stamp_of_attempt: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubjectPerformance {
    pub subject_id: i64,
    pub subject_name: String,
    pub average_score: f64,
    pub attempts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub best_score: f64,
    pub recent_attempts: Vec<ScoreDetail>,
    pub subject_performance: Vec<SubjectPerformance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProgress {
    pub timeline: Vec<ScoreDetail>,
    pub total_attempts: usize,
    pub improvement: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizLeaderboardEntry {
    pub user_name: String,
    pub score: f64,
    pub attempt_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GlobalLeaderboardEntry {
    pub user_id: i64,
    pub user_name: String,
    pub average_score: f64,
    pub quizzes_taken: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizAverage {
    pub quiz_id: i64,
    pub date_of_quiz: NaiveDate,
    pub chapter_name: String,
    pub average_score: f64,
    pub attempts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub user_count: i64,
    pub subject_count: i64,
    pub quiz_count: i64,
    pub quiz_stats: Vec<QuizAverage>,
    pub recent_scores: Vec<ScoreDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub total_users: i64,
    pub active_users: i64,
    pub participation_rate: f64,
    pub subjects: i64,
    pub chapters: i64,
    pub quizzes: i64,
    pub questions: i64,
    pub quiz_attempts: i64,
    pub avg_score: f64,
}

/// Assembled input for a per-user performance report artifact.
#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub user_id: i64,
    pub user_name: String,
    pub generated_at: DateTime<Utc>,
    pub stats: UserStats,
    pub scores: Vec<ScoreDetail>,
}

/// Per-user row of the admin-wide export.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserExportRow {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub quizzes_taken: i64,
    pub average_score: f64,
    pub best_score: f64,
    pub last_attempt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreFilter {
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

const SCORE_DETAIL_SELECT: &str = r#"
    SELECT sc.id AS score_id, sc.user_id, u.full_name AS user_name,
           sc.quiz_id, q.date_of_quiz, c.name AS chapter_name, s.name AS subject_name,
           sc.total_scored, sc.time_stamp_of_attempt
    FROM scores sc
    JOIN users u ON sc.user_id = u.id
    JOIN quizzes q ON sc.quiz_id = q.id
    JOIN chapters c ON q.chapter_id = c.id
    JOIN subjects s ON c.subject_id = s.id
"#;

#[derive(Clone)]
pub struct ReportingService {
    pool: PgPool,
}

impl ReportingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn user_scores(&self, user_id: i64, filter: &ScoreFilter) -> Result<Vec<ScoreDetail>> {
        let sql = format!(
            r#"{SCORE_DETAIL_SELECT}
            WHERE sc.user_id = $1
              AND ($2::bigint IS NULL OR s.id = $2)
              AND ($3::bigint IS NULL OR c.id = $3)
              AND ($4::date IS NULL OR sc.time_stamp_of_attempt >= $4)
              AND ($5::date IS NULL OR sc.time_stamp_of_attempt < $5 + INTERVAL '1 day')
            ORDER BY sc.time_stamp_of_attempt DESC
            "#
        );
        let scores = sqlx::query_as::<_, ScoreDetail>(&sql)
            .bind(user_id)
            .bind(filter.subject_id)
            .bind(filter.chapter_id)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(scores)
    }

    pub async fn all_scores(&self) -> Result<Vec<ScoreDetail>> {
        let sql = format!("{SCORE_DETAIL_SELECT} ORDER BY sc.time_stamp_of_attempt DESC");
        let scores = sqlx::query_as::<_, ScoreDetail>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(scores)
    }

    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        let total_quizzes: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM scores WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let average_score: Option<f64> =
            sqlx::query_scalar(r#"SELECT AVG(total_scored) FROM scores WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let best_score: Option<f64> =
            sqlx::query_scalar(r#"SELECT MAX(total_scored) FROM scores WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "{SCORE_DETAIL_SELECT} WHERE sc.user_id = $1 ORDER BY sc.time_stamp_of_attempt DESC LIMIT 5"
        );
        let recent_attempts = sqlx::query_as::<_, ScoreDetail>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let subject_performance = self.subject_performance(user_id).await?;

        Ok(UserStats {
            total_quizzes,
            average_score: round2(average_score.unwrap_or(0.0)),
            best_score: best_score.unwrap_or(0.0),
            recent_attempts,
            subject_performance,
        })
    }

    async fn subject_performance(&self, user_id: i64) -> Result<Vec<SubjectPerformance>> {
        let rows = sqlx::query_as::<_, SubjectPerformance>(
            r#"
            SELECT s.id AS subject_id, s.name AS subject_name,
                   AVG(sc.total_scored) AS average_score, COUNT(sc.id) AS attempts
            FROM subjects s
            JOIN chapters c ON c.subject_id = s.id
            JOIN quizzes q ON q.chapter_id = c.id
            JOIN scores sc ON sc.quiz_id = q.id
            WHERE sc.user_id = $1
            GROUP BY s.id, s.name
            ORDER BY average_score DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_progress(&self, user_id: i64) -> Result<UserProgress> {
        let sql =
            format!("{SCORE_DETAIL_SELECT} WHERE sc.user_id = $1 ORDER BY sc.time_stamp_of_attempt");
        let timeline = sqlx::query_as::<_, ScoreDetail>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let improvement = match (timeline.first(), timeline.last()) {
            (Some(first), Some(last)) if timeline.len() >= 2 => {
                round2(last.total_scored - first.total_scored)
            }
            _ => 0.0,
        };

        Ok(UserProgress {
            total_attempts: timeline.len(),
            improvement,
            timeline,
        })
    }

    pub async fn quiz_leaderboard(&self, quiz_id: i64) -> Result<Vec<QuizLeaderboardEntry>> {
        let quiz_exists: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;
        if quiz_exists.is_none() {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }

        let entries = sqlx::query_as::<_, QuizLeaderboardEntry>(
            r#"
            SELECT u.full_name AS user_name, sc.total_scored AS score,
                   sc.time_stamp_of_attempt AS attempt_date
            FROM scores sc
            JOIN users u ON sc.user_id = u.id
            WHERE sc.quiz_id = $1
            ORDER BY sc.total_scored DESC
            LIMIT 10
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn global_leaderboard(&self) -> Result<Vec<GlobalLeaderboardEntry>> {
        let entries = sqlx::query_as::<_, GlobalLeaderboardEntry>(
            r#"
            SELECT u.id AS user_id, u.full_name AS user_name,
                   AVG(sc.total_scored) AS average_score, COUNT(sc.id) AS quizzes_taken
            FROM users u
            JOIN scores sc ON sc.user_id = u.id
            GROUP BY u.id, u.full_name
            HAVING COUNT(sc.id) >= 3
            ORDER BY average_score DESC
            LIMIT 20
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn admin_dashboard(&self) -> Result<AdminDashboard> {
        let user_count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE role = 'user'"#)
                .fetch_one(&self.pool)
                .await?;
        let subject_count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM subjects"#)
            .fetch_one(&self.pool)
            .await?;
        let quiz_count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM quizzes"#)
            .fetch_one(&self.pool)
            .await?;

        let quiz_stats = sqlx::query_as::<_, QuizAverage>(
            r#"
            SELECT q.id AS quiz_id, q.date_of_quiz, c.name AS chapter_name,
                   AVG(sc.total_scored) AS average_score, COUNT(sc.id) AS attempts
            FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            JOIN scores sc ON sc.quiz_id = q.id
            GROUP BY q.id, q.date_of_quiz, c.name
            ORDER BY q.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let sql = format!("{SCORE_DETAIL_SELECT} ORDER BY sc.time_stamp_of_attempt DESC LIMIT 10");
        let recent_scores = sqlx::query_as::<_, ScoreDetail>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(AdminDashboard {
            user_count,
            subject_count,
            quiz_count,
            quiz_stats,
            recent_scores,
        })
    }

    pub async fn system_report(&self) -> Result<SystemReport> {
        let total_users: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE role = 'user'"#)
                .fetch_one(&self.pool)
                .await?;
        let active_users: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(DISTINCT user_id) FROM scores"#)
                .fetch_one(&self.pool)
                .await?;
        let subjects: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM subjects"#)
            .fetch_one(&self.pool)
            .await?;
        let chapters: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM chapters"#)
            .fetch_one(&self.pool)
            .await?;
        let quizzes: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM quizzes"#)
            .fetch_one(&self.pool)
            .await?;
        let questions: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM questions"#)
            .fetch_one(&self.pool)
            .await?;
        let quiz_attempts: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM scores"#)
            .fetch_one(&self.pool)
            .await?;
        let avg_score: Option<f64> = sqlx::query_scalar(r#"SELECT AVG(total_scored) FROM scores"#)
            .fetch_one(&self.pool)
            .await?;

        let participation_rate = if total_users > 0 {
            round2(100.0 * active_users as f64 / total_users as f64)
        } else {
            0.0
        };

        Ok(SystemReport {
            generated_at: Utc::now(),
            total_users,
            active_users,
            participation_rate,
            subjects,
            chapters,
            quizzes,
            questions,
            quiz_attempts,
            avg_score: round2(avg_score.unwrap_or(0.0)),
        })
    }

    pub async fn build_user_report(&self, user_id: i64) -> Result<UserReport> {
        let user_name: String = sqlx::query_scalar(r#"SELECT full_name FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        let stats = self.user_stats(user_id).await?;
        let scores = self.user_scores(user_id, &ScoreFilter::default()).await?;

        Ok(UserReport {
            user_id,
            user_name,
            generated_at: Utc::now(),
            stats,
            scores,
        })
    }

    pub async fn user_export_rows(&self) -> Result<Vec<UserExportRow>> {
        let rows = sqlx::query_as::<_, UserExportRow>(
            r#"
            SELECT u.id AS user_id, u.username, u.full_name, u.email,
                   COUNT(sc.id) AS quizzes_taken,
                   COALESCE(AVG(sc.total_scored), 0) AS average_score,
                   COALESCE(MAX(sc.total_scored), 0) AS best_score,
                   MAX(sc.time_stamp_of_attempt) AS last_attempt
            FROM users u
            LEFT JOIN scores sc ON sc.user_id = u.id
            WHERE u.role = 'user'
            GROUP BY u.id, u.username, u.full_name, u.email
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
