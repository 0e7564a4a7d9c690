//! Client side of the timed-attempt workflow: loads a quiz, holds the
//! answer sheet while the countdown runs, and submits exactly once.

pub mod answers;
pub mod session;
pub mod timer;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::dto::quiz_dto::{AttemptQuizResponse, SubmitQuizResponse, ViewAnswersResponse};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not authenticated")]
    Auth,
    #[error("not found: {0}")]
    NotFound(String),
    /// The server refused the request (validation failure, repeat attempt).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Transport failure. Retryable; the answer sheet is preserved.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// The server operations the attempt session needs. The REST client is the
/// production implementation; tests drive the session with a fake.
#[async_trait]
pub trait QuizBackend {
    async fn load_quiz(&self, quiz_id: i64) -> Result<AttemptQuizResponse, ClientError>;
    async fn submit_quiz(
        &self,
        quiz_id: i64,
        answers: &HashMap<i64, i32>,
    ) -> Result<SubmitQuizResponse, ClientError>;
    async fn view_answers(&self, quiz_id: i64) -> Result<ViewAnswersResponse, ClientError>;
}

/// REST implementation of [`QuizBackend`] carrying the user's bearer token.
#[derive(Clone)]
pub struct QuizApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl QuizApiClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth,
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ClientError::Rejected(message),
            _ => ClientError::Server(message),
        })
    }
}

#[async_trait]
impl QuizBackend for QuizApiClient {
    async fn load_quiz(&self, quiz_id: i64) -> Result<AttemptQuizResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/quiz/{}/attempt", self.base_url, quiz_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: i64,
        answers: &HashMap<i64, i32>,
    ) -> Result<SubmitQuizResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/quiz/{}/submit", self.base_url, quiz_id))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "answers": answers }))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn view_answers(&self, quiz_id: i64) -> Result<ViewAnswersResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/quiz/{}/answers", self.base_url, quiz_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::parse(response).await
    }
}
