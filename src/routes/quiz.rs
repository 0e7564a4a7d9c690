use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

use crate::dto::quiz_dto::SubmitQuizRequest;
use crate::middleware::auth::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChapterFilter {
    pub subject_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct QuizFilter {
    pub chapter_id: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_subjects(State(state): State<AppState>) -> crate::error::Result<Response> {
    let subjects = state.catalog_service.list_subjects().await?;
    Ok(Json(json!({ "subjects": subjects })).into_response())
}

#[axum::debug_handler]
pub async fn get_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> crate::error::Result<Response> {
    let subject = state.catalog_service.get_subject(subject_id).await?;
    let chapters = state.catalog_service.list_chapters(Some(subject_id)).await?;
    Ok(Json(json!({ "subject": subject, "chapters": chapters })).into_response())
}

#[axum::debug_handler]
pub async fn list_chapters(
    State(state): State<AppState>,
    Query(filter): Query<ChapterFilter>,
) -> crate::error::Result<Response> {
    let chapters = state.catalog_service.list_chapters(filter.subject_id).await?;
    Ok(Json(json!({ "chapters": chapters })).into_response())
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
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> crate::error::Result<Response> {
    let overview = state
        .quiz_service
        .quiz_overview(quiz_id, claims.user_id()?)
        .await?;
    Ok(Json(overview).into_response())
}

/// Serve the question set for an attempt. The countdown on the client is
/// seeded from `time_duration`; the answer key never leaves the server.
#[axum::debug_handler]
pub async fn attempt_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> crate::error::Result<Response> {
    let payload = state.quiz_service.attempt_payload(quiz_id).await?;
    Ok(Json(payload).into_response())
}

#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> crate::error::Result<Response> {
    let user_id = claims.user_id()?;
    tracing::info!(quiz_id, user_id, answers = req.answers.len(), "Quiz submission received");
    let result = state
        .scoring_service
        .submit_attempt(quiz_id, user_id, &req.answers)
        .await?;
    Ok(Json(result).into_response())
}

#[axum::debug_handler]
pub async fn view_answers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> crate::error::Result<Response> {
    let result = state
        .scoring_service
        .view_answers(quiz_id, claims.user_id()?)
        .await?;
    Ok(Json(result).into_response())
}
