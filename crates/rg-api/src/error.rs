//! Error types (rg-api)

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// rg-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] rg_core::Error),

    #[error("Schedule error: {0}")]
    Schedule(#[from] rg_schedule::ScheduleError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(rg_core::Error::CompletionTimeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Core(e) if e.is_completion() => StatusCode::BAD_GATEWAY,
            ApiError::Core(_) | ApiError::Schedule(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
