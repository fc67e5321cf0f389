use crate::error::TaError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;

pub const OVERLOADED_MESSAGE: &str =
    "Service temporarily overloaded (rate limit or quota exhausted). Please retry later.";

/// Errors returned to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{}", OVERLOADED_MESSAGE)]
    Overloaded,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error: request timed out after {}s", .0.as_secs_f32())]
    RequestTimeout(Duration),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::RequestTimeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Overloaded => "OVERLOADED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::RequestTimeout(_) => "REQUEST_TIMEOUT",
        }
    }
}

impl From<TaError> for ApiError {
    fn from(err: TaError) -> Self {
        match err {
            TaError::InvalidQuestion(message) => ApiError::BadRequest(message),
            err if err.is_capacity_exhausted() => ApiError::Overloaded,
            err => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
