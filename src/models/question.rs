use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A quiz question. Options are a fixed, ordered sequence of four strings;
/// `correct_option` is the 1-based index into that sequence, matching the
/// `option1..option4` convention at the storage and wire boundary (the
/// DTOs flatten the sequence back into sibling fields).
#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_statement: String,
    pub options: [String; 4],
    pub correct_option: i32,
    pub created_at: DateTime<Utc>,
}

/// Row shape as stored: four sibling option columns.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub question_statement: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub correct_option: i32,
    pub created_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            quiz_id: row.quiz_id,
            question_statement: row.question_statement,
            options: [row.option1, row.option2, row.option3, row.option4],
            correct_option: row.correct_option,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_options_keep_their_positions() {
        let row = QuestionRow {
            id: 1,
            quiz_id: 2,
            question_statement: "?".to_string(),
            option1: "a".to_string(),
            option2: "b".to_string(),
            option3: "c".to_string(),
            option4: "d".to_string(),
            correct_option: 2,
            created_at: Utc::now(),
        };
        let q = Question::from(row);
        assert_eq!(q.options[0], "a");
        assert_eq!(q.options[3], "d");
        assert_eq!(q.correct_option, 2);
    }
}
