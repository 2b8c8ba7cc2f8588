//! Error types for coshare-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coshare_service::ServiceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage backend could not be initialized
    #[error("Storage error: {0}")]
    Storage(#[from] coshare_storage::StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or unacceptable caller identity, or not permitted
    #[error("Unauthorized")]
    Unauthorized,

    /// Anonymous read ceiling reached for a token
    #[error("Too many requests")]
    RateLimited,

    /// Internal error; details stay in the server log
    #[error("Internal error")]
    Internal,
}

impl ApiError {
    pub fn collection_not_found() -> Self {
        ApiError::NotFound("collection".to_string())
    }

    /// Map a service error on an authenticated read, where a denial must
    /// be indistinguishable from a missing collection.
    pub fn concealing_denial(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized => ApiError::collection_not_found(),
            other => other.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::NotFound(what),
            ServiceError::Unauthorized => ApiError::Unauthorized,
            ServiceError::RateLimited => ApiError::RateLimited,
            ServiceError::Internal => ApiError::Internal,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
