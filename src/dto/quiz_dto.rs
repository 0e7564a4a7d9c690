use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// Question as served to a user taking the quiz: the answer key is stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptQuestion {
    pub id: i64,
    pub question_statement: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
}

impl From<Question> for AttemptQuestion {
    fn from(q: Question) -> Self {
        let [option1, option2, option3, option4] = q.options;
        AttemptQuestion {
            id: q.id,
            question_statement: q.question_statement,
            option1,
            option2,
            option3,
            option4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptQuizResponse {
    pub quiz_id: i64,
    pub questions: Vec<AttemptQuestion>,
    /// Duration in minutes, as authored on the quiz.
    pub time_duration: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizRequest {
    /// question id -> selected option (1-based).
    pub answers: HashMap<i64, i32>,
}

/// Question with the answer key revealed, for post-attempt review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerQuestion {
    pub id: i64,
    pub question_statement: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub correct_option: i32,
}

impl From<Question> for AnswerQuestion {
    fn from(q: Question) -> Self {
        let correct_option = q.correct_option;
        let [option1, option2, option3, option4] = q.options;
        AnswerQuestion {
            id: q.id,
            question_statement: q.question_statement,
            option1,
            option2,
            option3,
            option4,
            correct_option,
        }
    }
}

/// Per-question outcome included in the submit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    #[serde(flatten)]
    pub question: AnswerQuestion,
    pub user_answer: Option<i32>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuizResponse {
    /// Percentage 0..=100, one decimal.
    pub score: f64,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score_id: i64,
    pub questions: Vec<QuestionOutcome>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewAnswersResponse {
    pub quiz_id: i64,
    pub score: f64,
    pub attempt_date: DateTime<Utc>,
    pub remarks: Option<String>,
    pub questions: Vec<AnswerQuestion>,
}

/// Full question record as the admin screens see it.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
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

impl From<Question> for QuestionDetail {
    fn from(q: Question) -> Self {
        let (quiz_id, correct_option, created_at) = (q.quiz_id, q.correct_option, q.created_at);
        let [option1, option2, option3, option4] = q.options;
        QuestionDetail {
            id: q.id,
            quiz_id,
            question_statement: q.question_statement,
            option1,
            option2,
            option3,
            option4,
            correct_option,
            created_at,
        }
    }
}
