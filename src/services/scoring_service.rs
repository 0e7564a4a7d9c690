use std::collections::HashMap;

use crate::dto::quiz_dto::{
    AnswerQuestion, QuestionOutcome, SubmitQuizResponse, ViewAnswersResponse,
};
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::score::Score;
use chrono::Utc;
use sqlx::error::DatabaseError as _;
use sqlx::PgPool;

/// Result of grading one answer sheet against a question set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeOutcome {
    pub total_questions: usize,
    pub correct_answers: usize,
    /// 0..=100, one decimal of precision.
    pub percentage: f64,
}

/// Grade a sheet: one pass over the questions, counting exact matches of
/// the selected option against the 1-based answer key. Total over any
/// input: unanswered questions and mismatched or out-of-range selections
/// count as wrong, and an empty question set grades to 0.0 rather than
/// dividing by zero (the degenerate-attempt case).
pub fn grade(questions: &[Question], answers: &HashMap<i64, i32>) -> GradeOutcome {
    let total_questions = questions.len();
    let correct_answers = questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_option))
        .count();
    let percentage = if total_questions > 0 {
        round_one_decimal(100.0 * correct_answers as f64 / total_questions as f64)
    } else {
        0.0
    };
    GradeOutcome {
        total_questions,
        correct_answers,
        percentage,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Reject a submission whose sheet references questions outside the quiz or
/// selections outside 1..=4. The whole payload is refused rather than
/// partially scored.
pub fn validate_answers(questions: &[Question], answers: &HashMap<i64, i32>) -> Result<()> {
    for (question_id, selected) in answers {
        if !questions.iter().any(|q| q.id == *question_id) {
            return Err(Error::BadRequest(format!(
                "Answer references unknown question {}",
                question_id
            )));
        }
        if !(1..=4).contains(selected) {
            return Err(Error::BadRequest(format!(
                "Selected option {} for question {} is out of range",
                selected, question_id
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ScoringService {
    pool: PgPool,
}

impl ScoringService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Score a submitted attempt and persist the result. One Score row per
    /// (user, quiz); a repeat submission is refused with the original
    /// outcome referenced in the message.
    pub async fn submit_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        answers: &HashMap<i64, i32>,
    ) -> Result<SubmitQuizResponse> {
        let quiz_exists: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;
        if quiz_exists.is_none() {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }

        let existing: Option<Score> = sqlx::query_as(
            r#"SELECT * FROM scores WHERE user_id = $1 AND quiz_id = $2"#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(prior) = existing {
            return Err(Error::Conflict(format!(
                "You have already attempted this quiz (scored {} on {})",
                prior.total_scored,
                prior.time_stamp_of_attempt.to_rfc3339()
            )));
        }

        let questions = self.load_questions(quiz_id).await?;
        if questions.is_empty() {
            return Err(Error::NotFound(
                "No questions found for this quiz".to_string(),
            ));
        }

        validate_answers(&questions, answers)?;
        let outcome = grade(&questions, answers);

        let score: Score = sqlx::query_as(
            r#"
            INSERT INTO scores (user_id, quiz_id, total_scored, time_stamp_of_attempt)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .bind(outcome.percentage)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Two racing submissions from the same user resolve through the
            // unique index rather than a second Score row.
            if let sqlx::Error::Database(ref db) = e {
                if db.code().as_deref() == Some("23505") {
                    return Error::Conflict("You have already attempted this quiz".to_string());
                }
            }
            Error::from(e)
        })?;

        tracing::info!(
            quiz_id,
            user_id,
            percentage = outcome.percentage,
            correct = outcome.correct_answers,
            total = outcome.total_questions,
            "Attempt scored"
        );

        let questions = questions
            .into_iter()
            .map(|q| {
                let user_answer = answers.get(&q.id).copied();
                let is_correct = user_answer == Some(q.correct_option);
                QuestionOutcome {
                    question: AnswerQuestion::from(q),
                    user_answer,
                    is_correct,
                }
            })
            .collect();

        Ok(SubmitQuizResponse {
            score: outcome.percentage,
            total_questions: outcome.total_questions,
            correct_answers: outcome.correct_answers,
            score_id: score.id,
            questions,
            message: "Quiz submitted successfully".to_string(),
        })
    }

    /// Read-only review of a completed attempt: the persisted score plus
    /// the full question set with the answer key revealed.
    pub async fn view_answers(&self, quiz_id: i64, user_id: i64) -> Result<ViewAnswersResponse> {
        let score: Score = sqlx::query_as(
            r#"
            SELECT * FROM scores
            WHERE user_id = $1 AND quiz_id = $2
            ORDER BY time_stamp_of_attempt DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("No attempt found for this quiz".to_string()))?;

        let remarks: Option<String> =
            sqlx::query_scalar(r#"SELECT remarks FROM quizzes WHERE id = $1"#)
                .bind(quiz_id)
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        let questions = self.load_questions(quiz_id).await?;

        Ok(ViewAnswersResponse {
            quiz_id,
            score: score.total_scored,
            attempt_date: score.time_stamp_of_attempt,
            remarks,
            questions: questions.into_iter().map(AnswerQuestion::from).collect(),
        })
    }

    async fn load_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, crate::models::question::QuestionRow>(
            r#"SELECT * FROM questions WHERE quiz_id = $1 ORDER BY id"#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(id: i64, correct_option: i32) -> Question {
        Question {
            id,
            quiz_id: 1,
            question_statement: format!("Question {}", id),
            options: [
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_option,
            created_at: Utc::now(),
        }
    }

    fn sheet(entries: &[(i64, i32)]) -> HashMap<i64, i32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn fully_correct_sheet_scores_hundred() {
        let questions = vec![question(1, 1), question(2, 2), question(3, 3)];
        let outcome = grade(&questions, &sheet(&[(1, 1), (2, 2), (3, 3)]));
        assert_eq!(outcome.percentage, 100.0);
        assert_eq!(outcome.correct_answers, 3);
    }

    #[test]
    fn empty_sheet_scores_zero() {
        let questions = vec![question(1, 1), question(2, 2)];
        let outcome = grade(&questions, &HashMap::new());
        assert_eq!(outcome.percentage, 0.0);
        assert_eq!(outcome.correct_answers, 0);
        assert_eq!(outcome.total_questions, 2);
    }

    #[test]
    fn zero_questions_grades_to_zero_without_division_error() {
        let outcome = grade(&[], &sheet(&[(9, 1)]));
        assert_eq!(outcome.percentage, 0.0);
        assert_eq!(outcome.total_questions, 0);
    }

    #[test]
    fn mismatched_and_out_of_range_selections_count_as_wrong() {
        // Four questions keyed [1, 2, 3, 4]; q3 answered with 9.
        let questions = vec![
            question(1, 1),
            question(2, 2),
            question(3, 3),
            question(4, 4),
        ];
        let outcome = grade(&questions, &sheet(&[(1, 1), (2, 2), (3, 9), (4, 4)]));
        assert_eq!(outcome.correct_answers, 3);
        assert_eq!(outcome.percentage, 75.0);
    }

    #[test]
    fn adding_a_correct_answer_never_lowers_the_score() {
        let questions = vec![question(1, 1), question(2, 2), question(3, 3)];
        let mut answers = HashMap::new();
        let mut last = grade(&questions, &answers).percentage;
        for q in &questions {
            answers.insert(q.id, q.correct_option);
            let next = grade(&questions, &answers).percentage;
            assert!(next >= last);
            last = next;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        // 1 of 3 correct: 33.333.. -> 33.3
        let questions = vec![question(1, 1), question(2, 2), question(3, 3)];
        let outcome = grade(&questions, &sheet(&[(1, 1)]));
        assert_eq!(outcome.percentage, 33.3);

        // 2 of 3 correct: 66.666.. -> 66.7
        let outcome = grade(&questions, &sheet(&[(1, 1), (2, 2)]));
        assert_eq!(outcome.percentage, 66.7);
    }

    #[test]
    fn unknown_question_id_rejects_the_whole_sheet() {
        let questions = vec![question(1, 1)];
        let err = validate_answers(&questions, &sheet(&[(1, 1), (99, 2)])).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn out_of_range_selection_rejects_the_whole_sheet() {
        let questions = vec![question(1, 1)];
        let err = validate_answers(&questions, &sheet(&[(1, 9)])).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = validate_answers(&questions, &sheet(&[(1, 0)])).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
