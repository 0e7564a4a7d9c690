use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::middleware::auth::Claims;
use crate::services::reporting_service::ScoreFilter;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn get_user_scores(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ScoreQuery>,
) -> crate::error::Result<Response> {
    let filter = ScoreFilter {
        subject_id: query.subject_id,
        chapter_id: query.chapter_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let scores = state
        .reporting_service
        .user_scores(claims.user_id()?, &filter)
        .await?;
    Ok(Json(json!({ "scores": scores })).into_response())
}

#[axum::debug_handler]
pub async fn get_user_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let stats = state.reporting_service.user_stats(claims.user_id()?).await?;
    Ok(Json(json!({ "statistics": stats })).into_response())
}

#[axum::debug_handler]
pub async fn get_user_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let progress = state
        .reporting_service
        .user_progress(claims.user_id()?)
        .await?;
    Ok(Json(json!({ "progress": progress })).into_response())
}
