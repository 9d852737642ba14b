//! isquestion Client
//!
//! Async client for the `POST /is_question` endpoint. A semaphore caps the
//! number of requests in flight, so callers can fan out freely without
//! flooding the service.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or undecodable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client was closed
    #[error("Client closed")]
    Closed,
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `http://127.0.0.1:8080`
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Requests allowed in flight at once
    pub max_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(10),
            max_concurrency: 4,
        }
    }
}

#[derive(Debug, Serialize)]
struct IsQuestionRequest<'a> {
    sentence: &'a str,
}

#[derive(Debug, Deserialize)]
struct IsQuestionResponse {
    is_question: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Handle to the inference service; cheap to clone, clones share the limit
#[derive(Debug, Clone)]
pub struct IsQuestionClient {
    http: reqwest::Client,
    base_url: String,
    permits: Arc<Semaphore>,
}

impl IsQuestionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(ClientError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            permits: Arc::new(Semaphore::new(config.max_concurrency)),
        })
    }

    /// Ask the service whether `sentence` is a question
    pub async fn is_question(&self, sentence: &str) -> Result<bool> {
        let _permit = self.permits.acquire().await.map_err(|_| ClientError::Closed)?;

        let response = self
            .http
            .post(format!("{}/is_question", self.base_url))
            .json(&IsQuestionRequest { sentence })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), message = %message, "is_question request failed");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body: IsQuestionResponse = response.json().await?;
        Ok(body.is_question)
    }

    /// Classify many sentences concurrently, answers in input order
    pub async fn is_question_batch<S>(&self, sentences: &[S]) -> Vec<Result<bool>>
    where
        S: AsRef<str>,
    {
        let mut tasks = JoinSet::new();
        for (i, sentence) in sentences.iter().enumerate() {
            let client = self.clone();
            let sentence = sentence.as_ref().to_string();
            tasks.spawn(async move { (i, client.is_question(&sentence).await) });
        }

        let mut results: Vec<Option<Result<bool>>> = (0..sentences.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, result)) => results[i] = Some(result),
                Err(e) => tracing::error!(error = %e, "is_question task failed"),
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or(Err(ClientError::Closed)))
            .collect()
    }

    /// True when `GET /health` answers successfully
    pub async fn health(&self) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Requests that can start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuse new requests; those already in flight finish normally
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ClientConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            IsQuestionClient::new(config),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = IsQuestionClient::new(ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(client.available_permits(), 4);
    }

    #[tokio::test]
    async fn test_closed_client_refuses_requests() {
        let client = IsQuestionClient::new(ClientConfig::default()).unwrap();
        client.close();
        assert!(matches!(
            client.is_question("is it?").await,
            Err(ClientError::Closed)
        ));
    }
}
