use crate::dto::admin_dto::{
    CreateChapterRequest, CreateSubjectRequest, UpdateChapterRequest, UpdateSubjectRequest,
};
use crate::error::{Error, Result};
use crate::models::{chapter::Chapter, subject::Subject};
use sqlx::PgPool;

/// Subjects and chapters: the admin-authored catalog quizzes hang off.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(r#"SELECT * FROM subjects ORDER BY id"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(subjects)
    }

    pub async fn get_subject(&self, subject_id: i64) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(r#"SELECT * FROM subjects WHERE id = $1"#)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Subject not found".to_string()))?;
        Ok(subject)
    }

    pub async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"INSERT INTO subjects (name, description) VALUES ($1, $2) RETURNING *"#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(subject)
    }

    pub async fn update_subject(&self, subject_id: i64, req: UpdateSubjectRequest) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects
            SET name = COALESCE($1, name), description = COALESCE($2, description)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Subject not found".to_string()))?;
        Ok(subject)
    }

    pub async fn delete_subject(&self, subject_id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM subjects WHERE id = $1"#)
            .bind(subject_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Subject not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_chapters(&self, subject_id: Option<i64>) -> Result<Vec<Chapter>> {
        let chapters = sqlx::query_as::<_, Chapter>(
            r#"
            SELECT * FROM chapters
            WHERE ($1::bigint IS NULL OR subject_id = $1)
            ORDER BY id
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chapters)
    }

    pub async fn create_chapter(&self, req: CreateChapterRequest) -> Result<Chapter> {
        // Reject orphan chapters up front so the FK violation never surfaces as a 500.
        self.get_subject(req.subject_id).await?;
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"INSERT INTO chapters (subject_id, name, description) VALUES ($1, $2, $3) RETURNING *"#,
        )
        .bind(req.subject_id)
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(chapter)
    }

    pub async fn update_chapter(&self, chapter_id: i64, req: UpdateChapterRequest) -> Result<Chapter> {
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"
            UPDATE chapters
            SET name = COALESCE($1, name), description = COALESCE($2, description)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Chapter not found".to_string()))?;
        Ok(chapter)
    }

    pub async fn delete_chapter(&self, chapter_id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM chapters WHERE id = $1"#)
            .bind(chapter_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Chapter not found".to_string()));
        }
        Ok(())
    }
}
