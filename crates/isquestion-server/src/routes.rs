//! HTTP routes and handlers

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use isquestion_core::Verdict;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/is_question", post(is_question))
        .fallback(fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Classification request; a missing or null sentence is treated as empty
#[derive(Debug, Default, Deserialize)]
struct IsQuestionRequest {
    #[serde(default)]
    sentence: Option<String>,
}

#[derive(Debug, Serialize)]
struct IsQuestionResponse {
    is_question: bool,
}

async fn is_question(
    State(state): State<AppState>,
    Json(req): Json<IsQuestionRequest>,
) -> Result<Json<IsQuestionResponse>, AppError> {
    let request_id = Uuid::new_v4();
    metrics::counter!("isquestion_requests_total").increment(1);

    let sentence = req.sentence.unwrap_or_default();
    let pipeline = state.pipeline.clone();
    let start = Instant::now();

    // CPU-bound; keep it off the reactor
    let verdict = tokio::task::spawn_blocking(move || pipeline.evaluate(&sentence))
        .await
        .unwrap_or_else(|e| Verdict::Failed {
            reason: format!("inference task failed: {}", e),
        });

    let latency_us = start.elapsed().as_micros() as f64;
    metrics::histogram!("isquestion_inference_latency_us").record(latency_us);
    metrics::counter!("isquestion_verdicts_total", "outcome" => verdict.outcome()).increment(1);

    debug!(
        request_id = %request_id,
        outcome = verdict.outcome(),
        latency_us,
        "Evaluated sentence"
    );

    match verdict {
        Verdict::Failed { reason } => {
            warn!(request_id = %request_id, reason = %reason, "Inference failed");
            Err(AppError::InferenceFailed(reason))
        }
        verdict => Ok(Json(IsQuestionResponse {
            is_question: verdict.is_question().unwrap_or(false),
        })),
    }
}

async fn fallback() -> AppError {
    AppError::NotFound
}

/// Error handling
#[derive(Debug)]
enum AppError {
    NotFound,
    InferenceFailed(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            AppError::InferenceFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
