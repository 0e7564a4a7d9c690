use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::dto::export_dto::{ExportStartResponse, ExportStatusResponse};
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::services::export_queue_service::{
    KIND_ALL_SCORES, KIND_MONTHLY_REPORTS, KIND_USER_SCORES,
};
use crate::AppState;

fn is_admin(claims: &Claims) -> bool {
    claims
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
}

#[utoipa::path(
    post,
    path = "/api/export/user-quiz-data",
    responses(
        (status = 202, description = "Export task enqueued", body = Json<serde_json::Value>),
        (status = 401, description = "Missing or invalid token"),
    ),
)]
pub async fn start_user_export(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let user_id = claims.user_id()?;
    let task_id = state
        .export_queue_service
        .enqueue(KIND_USER_SCORES, Some(user_id))
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ExportStartResponse {
            status: "success".to_string(),
            message: "Export task started".to_string(),
            task_id,
            check_status_url: format!("/api/export/status/{}", task_id),
        }),
    )
        .into_response())
}

pub async fn start_admin_export(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let task_id = state
        .export_queue_service
        .enqueue(KIND_ALL_SCORES, Some(claims.user_id()?))
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ExportStartResponse {
            status: "success".to_string(),
            message: "Export task started".to_string(),
            task_id,
            check_status_url: format!("/api/export/status/{}", task_id),
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/export/status/{task_id}",
    params(
        ("task_id" = Uuid, Path, description = "Export task ID")
    ),
    responses(
        (status = 200, description = "Export task status", body = Json<serde_json::Value>),
        (status = 404, description = "Task not found"),
    ),
)]
pub async fn export_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let job = state.export_queue_service.get(task_id).await?;
    if !is_admin(&claims) && job.requested_by != Some(claims.user_id()?) {
        return Err(Error::NotFound("Export task not found".to_string()));
    }

    let response = match job.status.as_str() {
        "completed" => ExportStatusResponse {
            status: "completed".to_string(),
            message: "Export completed successfully".to_string(),
            download_url: job
                .file_key
                .as_ref()
                .map(|key| format!("/api/export/download/{}", key)),
            file_key: job.file_key,
        },
        "failed" => ExportStatusResponse {
            status: "failed".to_string(),
            message: job.error.unwrap_or_else(|| "Export failed".to_string()),
            file_key: None,
            download_url: None,
        },
        other => ExportStatusResponse {
            status: other.to_string(),
            message: "Export task is still running".to_string(),
            file_key: None,
            download_url: None,
        },
    };
    Ok(Json(response).into_response())
}

pub async fn download_export(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(file_key): Path<String>,
) -> crate::error::Result<Response> {
    // File keys are generated alphanumeric-with-underscores; anything else
    // is someone probing the filesystem.
    if !file_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::BadRequest("Invalid file key".to_string()));
    }

    let owner: Option<Option<i64>> =
        sqlx::query_scalar(r#"SELECT requested_by FROM export_jobs WHERE file_key = $1"#)
            .bind(&file_key)
            .fetch_optional(&state.pool)
            .await?;
    let Some(requested_by) = owner else {
        return Err(Error::NotFound("Export file not found".to_string()));
    };
    if !is_admin(&claims) && requested_by != Some(claims.user_id()?) {
        return Err(Error::NotFound("Export file not found".to_string()));
    }

    let path = format!("{}/{}.csv", crate::config::get_config().export_dir, file_key);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| Error::NotFound("Export file not found or expired".to_string()))?;
    let stream = ReaderStream::new(file);

    let disposition = format!("attachment; filename=\"{}.csv\"", file_key);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// Serve a generated monthly report. Users can read their own; the admin
/// can read anyone's.
pub async fn get_monthly_report(
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> crate::error::Result<Response> {
    if !is_admin(&claims) && claims.user_id()? != user_id {
        return Err(Error::NotFound("Report not found".to_string()));
    }

    let month = match query.month {
        Some(m) => {
            if m.len() != 6 || !m.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::BadRequest(
                    "Invalid month format. Use YYYYMM".to_string(),
                ));
            }
            m
        }
        None => chrono::Utc::now().format("%Y%m").to_string(),
    };

    let dir = &crate::config::get_config().export_dir;
    for (ext, content_type) in [("html", "text/html"), ("csv", "text/csv")] {
        let path = format!("{}/monthly_{}_{}.{}", dir, user_id, month, ext);
        if let Ok(body) = tokio::fs::read_to_string(&path).await {
            return Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.to_string())],
                body,
            )
                .into_response());
        }
    }
    Err(Error::NotFound(format!(
        "Monthly report for {} not found",
        month
    )))
}

pub async fn generate_monthly_reports(
    State(state): State<AppState>,
) -> crate::error::Result<Response> {
    let task_id = state
        .export_queue_service
        .enqueue(KIND_MONTHLY_REPORTS, None)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "success",
            "message": "Monthly report generation task started",
            "task_id": task_id,
        })),
    )
        .into_response())
}
