use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    /// Percentage 0..=100 with one decimal of precision.
    pub total_scored: f64,
    pub time_stamp_of_attempt: DateTime<Utc>,
}
