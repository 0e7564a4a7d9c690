use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: i64,
    pub chapter_id: i64,
    pub date_of_quiz: NaiveDate,
    /// Duration in minutes. Served as authored; the attempt client applies
    /// the 10-minute fallback when this is non-positive.
    pub time_duration: i32,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}
