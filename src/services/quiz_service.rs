use crate::dto::admin_dto::{
    CreateQuestionRequest, CreateQuizRequest, UpdateQuestionRequest, UpdateQuizRequest,
};
use crate::dto::quiz_dto::{AttemptQuizResponse, AttemptQuestion};
use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionRow};
use crate::models::quiz::Quiz;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Quiz listing entry with its place in the catalog and question count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub chapter_id: i64,
    pub date_of_quiz: NaiveDate,
    pub time_duration: i32,
    pub remarks: Option<String>,
    pub chapter_name: String,
    pub subject_name: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizOverview {
    pub quiz: QuizSummary,
    pub has_attempted: bool,
    pub score: Option<f64>,
    pub attempt_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(r#"SELECT * FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))?;
        Ok(quiz)
    }

    pub async fn list_quizzes(&self, chapter_id: Option<i64>) -> Result<Vec<QuizSummary>> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT q.id, q.chapter_id, q.date_of_quiz, q.time_duration, q.remarks,
                   c.name AS chapter_name, s.name AS subject_name,
                   (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count
            FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            JOIN subjects s ON c.subject_id = s.id
            WHERE ($1::bigint IS NULL OR q.chapter_id = $1)
            ORDER BY q.date_of_quiz, q.id
            "#,
        )
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    /// Quiz detail for the browse view, including whether the requesting
    /// user has already taken it.
    pub async fn quiz_overview(&self, quiz_id: i64, user_id: i64) -> Result<QuizOverview> {
        let quiz = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT q.id, q.chapter_id, q.date_of_quiz, q.time_duration, q.remarks,
                   c.name AS chapter_name, s.name AS subject_name,
                   (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count
            FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            JOIN subjects s ON c.subject_id = s.id
            WHERE q.id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))?;

        let prior: Option<(f64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT total_scored, time_stamp_of_attempt FROM scores
            WHERE quiz_id = $1 AND user_id = $2
            ORDER BY time_stamp_of_attempt DESC
            LIMIT 1
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(QuizOverview {
            quiz,
            has_attempted: prior.is_some(),
            score: prior.map(|(s, _)| s),
            attempt_date: prior.map(|(_, t)| t),
        })
    }

    pub async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE quiz_id = $1 ORDER BY id"#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    /// The payload served when a user opens the quiz-taking view: the
    /// question set with the answer key stripped, plus the authored
    /// duration the client seeds its countdown from.
    pub async fn attempt_payload(&self, quiz_id: i64) -> Result<AttemptQuizResponse> {
        let quiz = self.get_quiz(quiz_id).await?;
        let questions = self.questions_for_quiz(quiz_id).await?;
        Ok(AttemptQuizResponse {
            quiz_id: quiz.id,
            questions: questions.into_iter().map(AttemptQuestion::from).collect(),
            time_duration: Some(quiz.time_duration),
        })
    }

    pub async fn create_quiz(&self, req: CreateQuizRequest) -> Result<Quiz> {
        let chapter_exists: Option<i64> =
            sqlx::query_scalar(r#"SELECT id FROM chapters WHERE id = $1"#)
                .bind(req.chapter_id)
                .fetch_optional(&self.pool)
                .await?;
        if chapter_exists.is_none() {
            return Err(Error::NotFound("Chapter not found".to_string()));
        }

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (chapter_id, date_of_quiz, time_duration, remarks)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(req.chapter_id)
        .bind(req.date_of_quiz)
        .bind(req.time_duration)
        .bind(&req.remarks)
        .fetch_one(&self.pool)
        .await?;
        Ok(quiz)
    }

    /// Duration edits must not reach in-flight attempts; the attempt payload
    /// snapshots the duration at load time, so an update only affects loads
    /// that happen after it.
    pub async fn update_quiz(&self, quiz_id: i64, req: UpdateQuizRequest) -> Result<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET date_of_quiz = COALESCE($1, date_of_quiz),
                time_duration = COALESCE($2, time_duration),
                remarks = COALESCE($3, remarks)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(req.date_of_quiz)
        .bind(req.time_duration)
        .bind(&req.remarks)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))?;
        Ok(quiz)
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }
        Ok(())
    }

    pub async fn get_question(&self, question_id: i64) -> Result<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(r#"SELECT * FROM questions WHERE id = $1"#)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
        Ok(row.into())
    }

    pub async fn list_questions(&self, quiz_id: Option<i64>) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT * FROM questions
            WHERE ($1::bigint IS NULL OR quiz_id = $1)
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    pub async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question> {
        self.get_quiz(req.quiz_id).await?;
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions (quiz_id, question_statement, option1, option2, option3, option4, correct_option)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(req.quiz_id)
        .bind(&req.question_statement)
        .bind(&req.option1)
        .bind(&req.option2)
        .bind(&req.option3)
        .bind(&req.option4)
        .bind(req.correct_option)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        req: UpdateQuestionRequest,
    ) -> Result<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            UPDATE questions
            SET question_statement = COALESCE($1, question_statement),
                option1 = COALESCE($2, option1),
                option2 = COALESCE($3, option2),
                option3 = COALESCE($4, option3),
                option4 = COALESCE($5, option4),
                correct_option = COALESCE($6, correct_option)
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&req.question_statement)
        .bind(&req.option1)
        .bind(&req.option2)
        .bind(&req.option3)
        .bind(&req.option4)
        .bind(req.correct_option)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
        Ok(row.into())
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM questions WHERE id = $1"#)
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Question not found".to_string()));
        }
        Ok(())
    }
}
