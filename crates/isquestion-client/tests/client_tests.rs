//! Client tests against a stub inference server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use isquestion_client::{ClientConfig, ClientError, IsQuestionClient};
use serde_json::{json, Value};

#[derive(Default)]
struct StubState {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    served: AtomicUsize,
}

async fn stub_is_question(
    State(state): State<Arc<StubState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    state.served.fetch_add(1, Ordering::SeqCst);

    let sentence = body["sentence"].as_str().unwrap_or_default();
    if sentence == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "inference failed" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "is_question": sentence.trim_end().ends_with('?') })),
    )
}

async fn spawn_stub() -> (String, Arc<StubState>) {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/is_question", post(stub_is_question))
        .route("/health", get(|| async { "OK" }))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn client(base_url: String, max_concurrency: usize) -> IsQuestionClient {
    IsQuestionClient::new(ClientConfig {
        base_url,
        max_concurrency,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_answers_true_and_false() {
    let (url, _) = spawn_stub().await;
    let client = client(url, 2);

    assert!(client.is_question("Is it raining?").await.unwrap());
    assert!(!client.is_question("It is raining.").await.unwrap());
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let (url, _) = spawn_stub().await;
    let client = client(url, 2);

    match client.is_question("boom").await {
        Err(ClientError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "inference failed");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health() {
    let (url, _) = spawn_stub().await;
    assert!(client(url, 1).health().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_service_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(format!("http://{}", addr), 1);
    assert!(matches!(
        client.is_question("anyone there?").await,
        Err(ClientError::Http(_))
    ));
}

#[tokio::test]
async fn test_batch_respects_concurrency_limit() {
    let (url, state) = spawn_stub().await;
    let client = client(url, 3);

    let sentences: Vec<String> = (0..12)
        .map(|i| {
            if i % 2 == 0 {
                format!("Is item {} ready?", i)
            } else {
                format!("Item {} is ready.", i)
            }
        })
        .collect();

    let results = client.is_question_batch(&sentences).await;

    assert_eq!(results.len(), 12);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(*result.as_ref().unwrap(), i % 2 == 0, "sentence {}", i);
    }
    assert_eq!(state.served.load(Ordering::SeqCst), 12);
    assert!(state.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(client.available_permits(), 3);
}

#[tokio::test]
async fn test_batch_keeps_failures_in_place() {
    let (url, _) = spawn_stub().await;
    let client = client(url, 2);

    let results = client
        .is_question_batch(&["Why?", "boom", "Fine."])
        .await;

    assert!(*results[0].as_ref().unwrap());
    assert!(matches!(results[1], Err(ClientError::Server { .. })));
    assert!(!*results[2].as_ref().unwrap());
}
