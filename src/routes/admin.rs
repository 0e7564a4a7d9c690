use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::dto::admin_dto::{
    CreateChapterRequest, CreateQuestionRequest, CreateQuizRequest, CreateSubjectRequest,
    UpdateChapterRequest, UpdateQuestionRequest, UpdateQuizRequest, UpdateSubjectRequest,
};
use crate::dto::quiz_dto::QuestionDetail;
use crate::error::Error;
use crate::AppState;

#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>) -> crate::error::Result<Response> {
    let statistics = state.reporting_service.admin_dashboard().await?;
    Ok(Json(json!({ "statistics": statistics })).into_response())
}

#[axum::debug_handler]
pub async fn report(State(state): State<AppState>) -> crate::error::Result<Response> {
    let report = state.reporting_service.system_report().await?;
    Ok(Json(json!({ "report": report })).into_response())
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> crate::error::Result<Response> {
    let users = state.user_service.list_users().await?;
    Ok(Json(json!({ "users": users })).into_response())
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> crate::error::Result<Response> {
    let user = state.user_service.get_user(user_id).await?;
    let stats = state.reporting_service.user_stats(user_id).await?;
    Ok(Json(json!({ "user": user, "statistics": stats })).into_response())
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.user_service.delete_user(user_id).await?;
    tracing::info!(user_id, "User deleted by admin");
    Ok(Json(json!({ "message": "User deleted" })).into_response())
}

#[axum::debug_handler]
pub async fn all_scores(State(state): State<AppState>) -> crate::error::Result<Response> {
    let scores = state.reporting_service.all_scores().await?;
    Ok(Json(json!({ "scores": scores })).into_response())
}

// ── Subjects ──

#[axum::debug_handler]
pub async fn create_subject(
    State(state): State<AppState>,
    Json(req): Json<CreateSubjectRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let subject = state.catalog_service.create_subject(req).await?;
    Ok((StatusCode::CREATED, Json(subject)).into_response())
}

#[axum::debug_handler]
pub async fn update_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
    Json(req): Json<UpdateSubjectRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let subject = state.catalog_service.update_subject(subject_id, req).await?;
    Ok(Json(subject).into_response())
}

#[axum::debug_handler]
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.catalog_service.delete_subject(subject_id).await?;
    Ok(Json(json!({ "message": "Subject deleted" })).into_response())
}

// ── Chapters ──

#[axum::debug_handler]
pub async fn create_chapter(
    State(state): State<AppState>,
    Json(req): Json<CreateChapterRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let chapter = state.catalog_service.create_chapter(req).await?;
    Ok((StatusCode::CREATED, Json(chapter)).into_response())
}

#[axum::debug_handler]
pub async fn update_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
    Json(req): Json<UpdateChapterRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let chapter = state.catalog_service.update_chapter(chapter_id, req).await?;
    Ok(Json(chapter).into_response())
}

#[axum::debug_handler]
pub async fn delete_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.catalog_service.delete_chapter(chapter_id).await?;
    Ok(Json(json!({ "message": "Chapter deleted" })).into_response())
}

// ── Quizzes ──

#[derive(Debug, Deserialize)]
pub struct QuizFilter {
    pub chapter_id: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_quizzes(
    State(state): State<AppState>,
    Query(filter): Query<QuizFilter>,
) -> crate::error::Result<Response> {
    let quizzes = state.quiz_service.list_quizzes(filter.chapter_id).await?;
    Ok(Json(json!({ "quizzes": quizzes })).into_response())
}

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(req): Json<CreateQuizRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let quiz = state.quiz_service.create_quiz(req).await?;
    Ok((StatusCode::CREATED, Json(quiz)).into_response())
}

#[axum::debug_handler]
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<UpdateQuizRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let quiz = state.quiz_service.update_quiz(quiz_id, req).await?;
    Ok(Json(quiz).into_response())
}

#[axum::debug_handler]
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.quiz_service.delete_quiz(quiz_id).await?;
    Ok(Json(json!({ "message": "Quiz deleted" })).into_response())
}

// ── Questions ──

#[derive(Debug, Deserialize)]
pub struct QuestionFilter {
    pub quiz_id: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(filter): Query<QuestionFilter>,
) -> crate::error::Result<Response> {
    let questions: Vec<QuestionDetail> = state
        .quiz_service
        .list_questions(filter.quiz_id)
        .await?
        .into_iter()
        .map(QuestionDetail::from)
        .collect();
    Ok(Json(json!({ "questions": questions })).into_response())
}

#[axum::debug_handler]
pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> crate::error::Result<Response> {
    let question = state.quiz_service.get_question(question_id).await?;
    Ok(Json(QuestionDetail::from(question)).into_response())
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let question = state.quiz_service.create_question(req).await?;
    Ok((StatusCode::CREATED, Json(QuestionDetail::from(question))).into_response())
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
    Json(req): Json<UpdateQuestionRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let question = state.quiz_service.update_question(question_id, req).await?;
    Ok(Json(QuestionDetail::from(question)).into_response())
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.quiz_service.delete_question(question_id).await?;
    Ok(Json(json!({ "message": "Question deleted" })).into_response())
}

// ── CSV import ──

/// Bulk-load catalog entities from an uploaded CSV. Rows are applied
/// individually; bad rows are reported back rather than aborting the batch.
pub async fn import_csv(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    mut multipart: Multipart,
) -> crate::error::Result<Response> {
    let mut data: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            data = Some(field.bytes().await?.to_vec());
        }
    }
    let Some(data) = data else {
        return Err(Error::BadRequest("Missing 'file' field".to_string()));
    };

    let mut reader = csv::Reader::from_reader(data.as_slice());
    let mut imported = 0usize;
    let mut errors: Vec<String> = Vec::new();

    match entity.as_str() {
        "subjects" => {
            for (idx, row) in reader.deserialize::<CreateSubjectRequest>().enumerate() {
                match apply(row, |req| state.catalog_service.create_subject(req)).await {
                    Ok(()) => imported += 1,
                    Err(e) => errors.push(format!("row {}: {}", idx + 1, e)),
                }
            }
        }
        "chapters" => {
            for (idx, row) in reader.deserialize::<CreateChapterRequest>().enumerate() {
                match apply(row, |req| state.catalog_service.create_chapter(req)).await {
                    Ok(()) => imported += 1,
                    Err(e) => errors.push(format!("row {}: {}", idx + 1, e)),
                }
            }
        }
        "quizzes" => {
            for (idx, row) in reader.deserialize::<CreateQuizRequest>().enumerate() {
                match apply(row, |req| state.quiz_service.create_quiz(req)).await {
                    Ok(()) => imported += 1,
                    Err(e) => errors.push(format!("row {}: {}", idx + 1, e)),
                }
            }
        }
        other => {
            return Err(Error::BadRequest(format!(
                "Unknown import entity '{}'. Supported: subjects, chapters, quizzes",
                other
            )));
        }
    }

    tracing::info!(entity, imported, failed = errors.len(), "CSV import finished");
    Ok(Json(json!({ "imported": imported, "errors": errors })).into_response())
}

async fn apply<T, R, F, Fut>(row: csv::Result<T>, create: F) -> crate::error::Result<()>
where
    T: Validate,
    F: FnOnce(T) -> Fut,
    Fut: std::future::Future<Output = crate::error::Result<R>>,
{
    let req = row?;
    req.validate()?;
    create(req).await?;
    Ok(())
}

// ── Background job triggers ──

#[axum::debug_handler]
pub async fn trigger_daily_reminders(
    State(state): State<AppState>,
) -> crate::error::Result<Response> {
    let queued = state.notification_service.send_daily_reminders().await?;
    Ok(Json(json!({
        "message": "Daily reminders queued",
        "queued": queued,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn trigger_monthly_reports(
    State(state): State<AppState>,
) -> crate::error::Result<Response> {
    let task_id = state
        .export_queue_service
        .enqueue(crate::services::export_queue_service::KIND_MONTHLY_REPORTS, None)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Monthly report generation task started",
            "task_id": task_id,
        })),
    )
        .into_response())
}
