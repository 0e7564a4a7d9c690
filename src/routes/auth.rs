use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::auth_dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::middleware::auth::Claims;
use crate::utils::token::create_access_token;
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let user = state.user_service.register(req).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    let access_token = create_access_token(user.id, &user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { user, access_token }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;
    let access_token = create_access_token(user.id, &user.role)?;
    Ok(Json(AuthResponse { user, access_token }).into_response())
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let user = state.user_service.get_user(claims.user_id()?).await?;
    Ok(Json(user).into_response())
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let user = state
        .user_service
        .update_profile(claims.user_id()?, req)
        .await?;
    Ok(Json(user).into_response())
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state
        .user_service
        .change_password(claims.user_id()?, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Password updated" })).into_response())
}
