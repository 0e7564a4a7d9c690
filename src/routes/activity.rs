use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn quiz_leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> crate::error::Result<Response> {
    let leaderboard = state.reporting_service.quiz_leaderboard(quiz_id).await?;
    Ok(Json(json!({ "quiz_id": quiz_id, "leaderboard": leaderboard })).into_response())
}

#[axum::debug_handler]
pub async fn global_leaderboard(State(state): State<AppState>) -> crate::error::Result<Response> {
    let leaderboard = state.reporting_service.global_leaderboard().await?;
    Ok(Json(json!({ "leaderboard": leaderboard })).into_response())
}
