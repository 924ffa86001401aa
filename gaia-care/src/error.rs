//! HTTP error mapping for gaia-care
//!
//! Domain errors map to precise statuses. Infrastructure errors are logged
//! in full and reported to the client only generically.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gaia_common::Error;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller identity missing or unknown (401)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Body, path or query string that could not be decoded (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Error raised by a domain operation
    #[error(transparent)]
    Domain(#[from] Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Domain(err) => domain_status(err),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

fn domain_status(err: Error) -> (StatusCode, &'static str, String) {
    if err.is_infrastructure() {
        error!("Request failed: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error".to_string(),
        );
    }

    let (status, code) = match &err {
        Error::Denied { .. } => (StatusCode::FORBIDDEN, "DENIED"),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::InvalidInteraction(_) => (StatusCode::BAD_REQUEST, "INVALID_INTERACTION"),
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        Error::DuplicateRelation { .. } => (StatusCode::CONFLICT, "DUPLICATE_RELATION"),
        Error::AlreadyResolved(_) => (StatusCode::CONFLICT, "ALREADY_RESOLVED"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (status, code, err.to_string())
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
