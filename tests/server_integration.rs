//! HTTP API tests driven through the router without binding a socket

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{CountingEmbedder, FailingEmbedder, Fixture, HashingEmbedder, FORUM, GA1_COURSE};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use virtual_ta::server::{build_router, OVERLOADED_MESSAGE};

fn router(fixture: &Fixture, embedder: impl virtual_ta::embedding::EmbeddingProvider + 'static) -> Router {
    build_router(Arc::new(fixture.engine(embedder)), Duration::from_secs(30))
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_status_endpoint() {
    let fixture = Fixture::new(None, None);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = send(router(&fixture, HashingEmbedder), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Virtual TA is running");
}

#[tokio::test]
async fn test_override_question_with_image() {
    let fixture = Fixture::new(Some(GA1_COURSE), Some(FORUM));
    let payload = json!({
        "question": "Should I use gpt-4o-mini or gpt3.5?",
        "image": "aGVsbG8=",
    });

    let (status, body) = send(router(&fixture, HashingEmbedder), post(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .contains("gpt-3.5-turbo-0125"));
    assert_eq!(body["links"].as_array().unwrap().len(), 2);
    assert!(body["links"][0]["url"].as_str().unwrap().ends_with("/155939/4"));
    assert!(body["links"][0]["text"].is_string());
}

#[tokio::test]
async fn test_retrieved_answer() {
    let fixture = Fixture::new(Some(GA1_COURSE), None);
    let payload = json!({"question": "When is the GA1 deadline?"});

    let (status, body) = send(router(&fixture, HashingEmbedder), post(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "The deadline for GA1 is Jan 15.");
    assert_eq!(body["links"][0]["url"], "course");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let fixture = Fixture::new(None, None);
    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();

    let response = router(&fixture, HashingEmbedder)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_bad_requests() {
    let fixture = Fixture::new(Some(GA1_COURSE), None);

    let (status, body) = send(
        router(&fixture, HashingEmbedder),
        post(json!({"question": "   "}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(router(&fixture, HashingEmbedder), post("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        router(&fixture, HashingEmbedder),
        post(json!({"image": "aGVsbG8="}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quota_failure_is_503() {
    let fixture = Fixture::new(Some(GA1_COURSE), None);
    let embedder = FailingEmbedder {
        message: "rate limit exceeded".to_string(),
    };

    let (status, body) = send(
        router(&fixture, embedder),
        post(json!({"question": "When is the GA1 deadline?"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["message"], OVERLOADED_MESSAGE);
}

#[tokio::test]
async fn test_other_failure_is_500() {
    let fixture = Fixture::new(Some(GA1_COURSE), None);
    let embedder = FailingEmbedder {
        message: "model crashed".to_string(),
    };

    let (status, body) = send(
        router(&fixture, embedder),
        post(json!({"question": "When is the GA1 deadline?"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Internal server error: "));
    assert!(message.contains("model crashed"));
}

#[tokio::test]
async fn test_request_timeout_has_error_body_and_build_survives() {
    let fixture = Fixture::new(Some(GA1_COURSE), None);
    let (embedder, batches) = CountingEmbedder::new(Duration::from_millis(600));
    let engine = Arc::new(fixture.engine(embedder));
    let app = build_router(Arc::clone(&engine), Duration::from_millis(200));
    let question = json!({"question": "When is the GA1 deadline?"}).to_string();

    let (status, body) = send(app.clone(), post(question.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Internal server error: request timed out"));

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(engine.is_built());

    let (status, body) = send(app, post(question)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "The deadline for GA1 is Jan 15.");
    assert_eq!(batches.load(Ordering::SeqCst), 1);
}
