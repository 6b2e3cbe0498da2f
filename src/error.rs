//! API error taxonomy and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`. Errors are rendered as the
//! same structured envelope the success path uses (`success` flag + message)
//! so callers never have to parse two response shapes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested entity absent. Carries the entity kind for the message.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request body failed boundary validation. No writes were performed.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// Duplicate unique key, detected before any write was attempted.
    #[error("{0}")]
    Conflict(String),

    /// Missing or wrong admin API key.
    #[error("invalid or missing API key")]
    Unauthorized,

    /// Underlying storage failure. Logged in full, surfaced generically.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new(self.to_string())),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    message: "validation failed".to_string(),
                    errors,
                },
            ),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, ErrorBody::new(self.to_string())),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new(self.to_string()))
            }
            ApiError::Storage(e) => {
                error!("Storage error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
