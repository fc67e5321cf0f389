//! HTTP surface for the QA engine
//!
//! `GET /` is a liveness check; `POST /` takes `{question, image?}` and returns
//! `{answer, links}`. Images are accepted for compatibility and ignored.

mod error;
#[cfg(unix)]
mod signals;

pub use error::{ApiError, OVERLOADED_MESSAGE};

use crate::config::ServerConfig;
use crate::error::{Result, TaError};
use crate::qa::{AnswerResponse, QaEngine};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{from_fn, map_response_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Base64 screenshots can be large
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Router with both endpoints and the middleware stack
pub fn build_router(engine: Arc<QaEngine>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(status).post(ask))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response_with_state(request_timeout, timeout_as_error))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Virtual TA is running",
    }))
}

async fn ask(
    State(engine): State<Arc<QaEngine>>,
    payload: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> std::result::Result<Json<AnswerResponse>, ApiError> {
    let Json(request) = payload?;
    if request.image.is_some() {
        tracing::debug!("Ignoring attached image");
    }

    let response = engine.answer(&request.question).await?;
    Ok(Json(response))
}

/// The timeout layer answers with a bare status; give it the usual error body
async fn timeout_as_error(State(limit): State<Duration>, response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::RequestTimeout(limit).into_response();
    }
    response
}

/// Tag each request with an id, reusing the caller's when present
async fn request_id(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = tracing::info_span!("request", id = %id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serve until SIGINT or SIGTERM. With `warm` the knowledge base is built
/// before the listener opens.
pub async fn serve(engine: Arc<QaEngine>, config: &ServerConfig, warm: bool) -> Result<()> {
    if warm {
        if let Err(e) = engine.warm_up().await {
            tracing::warn!("Warm-up failed, the first question will retry: {}", e);
        }
    }

    let app = build_router(
        Arc::clone(&engine),
        Duration::from_secs(config.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TaError::Io {
            source: e,
            context: format!("Failed to bind {}", addr),
        })?;

    tracing::info!("Virtual TA listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(engine))
        .await
        .map_err(|e| TaError::Io {
            source: e,
            context: "HTTP server failed".to_string(),
        })?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on a shutdown signal. SIGUSR1 rebuilds the knowledge base in the
/// background and keeps waiting.
#[cfg(unix)]
async fn shutdown_signal(engine: Arc<QaEngine>) {
    use signals::{ServerSignal, SignalHandler};

    let mut handler = match SignalHandler::new() {
        Ok(handler) => handler,
        Err(e) => {
            tracing::warn!("{}; falling back to Ctrl+C only", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    loop {
        match handler.wait().await {
            ServerSignal::Shutdown(name) => {
                tracing::info!("{} received, shutting down", name);
                return;
            }
            ServerSignal::Rebuild => {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    if let Err(e) = engine.rebuild().await {
                        tracing::error!("Knowledge base rebuild failed: {}", e);
                    }
                });
            }
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal(_engine: Arc<QaEngine>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Ctrl+C received, shutting down");
    }
}
