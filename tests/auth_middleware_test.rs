use std::env;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::get,
    Router,
};
use quiz_master_backend::middleware::auth::{require_admin, require_bearer_auth};
use quiz_master_backend::utils::token::create_access_token;
use tower::ServiceExt;

fn init_test_config() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("DATABASE_URL", "postgres://localhost/quiz_master_test");
    env::set_var("JWT_SECRET", "middleware-test-secret");
    env::set_var("TOKEN_EXPIRY_HOURS", "24");
    env::set_var("ADMIN_USERNAME", "admin");
    env::set_var("ADMIN_PASSWORD", "admin123");
    env::set_var("EXPORT_DIR", "/tmp/quiz-master-exports");
    let _ = quiz_master_backend::config::init_config();
}

async fn protected() -> &'static str {
    "ok"
}

fn user_router() -> Router {
    Router::new()
        .route("/protected", get(protected))
        .layer(from_fn(require_bearer_auth))
}

fn admin_router() -> Router {
    Router::new()
        .route("/admin-only", get(protected))
        .layer(from_fn(require_admin))
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    init_test_config();
    let resp = user_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_unauthorized() {
    init_test_config();
    let resp = user_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn basic_scheme_is_rejected() {
    init_test_config();
    let resp = user_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_passes_through() {
    init_test_config();
    let token = create_access_token(7, "user").expect("token");
    let resp = user_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_token_cannot_reach_admin_routes() {
    init_test_config();
    let token = create_access_token(7, "user").expect("token");
    let resp = admin_router()
        .oneshot(
            Request::builder()
                .uri("/admin-only")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_token_reaches_admin_routes() {
    init_test_config();
    let token = create_access_token(1, "admin").expect("token");
    let resp = admin_router()
        .oneshot(
            Request::builder()
                .uri("/admin-only")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
