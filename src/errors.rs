// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every variant maps to an HTTP status code and an error code
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("Internal server error")]
    InternalError,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Upload exceeds the limit of {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl FolioError {
    fn error_code(&self) -> &'static str {
        match self {
            FolioError::NotFound(_) => "NOT_FOUND",
            FolioError::AlreadyExists(_) => "ALREADY_EXISTS",
            FolioError::DatabaseError(_) => "DATABASE_ERROR",
            FolioError::InvalidInput(_) => "INVALID_INPUT",
            FolioError::ValidationError(_) => "VALIDATION_ERROR",
            FolioError::Unauthorized => "UNAUTHORIZED",
            FolioError::Forbidden => "FORBIDDEN",
            FolioError::InternalError => "INTERNAL_ERROR",
            FolioError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            FolioError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            FolioError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            FolioError::StorageError(_) => "STORAGE_ERROR",
        }
    }
}

/// Convert FolioError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for FolioError {
    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs
        let message = match self {
            FolioError::DatabaseError(_) | FolioError::StorageError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            FolioError::NotFound(_) => StatusCode::NOT_FOUND,
            FolioError::AlreadyExists(_) => StatusCode::CONFLICT,
            FolioError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FolioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FolioError::ValidationError(_) => StatusCode::BAD_REQUEST,
            FolioError::Unauthorized => StatusCode::UNAUTHORIZED,
            FolioError::Forbidden => StatusCode::FORBIDDEN,
            FolioError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            FolioError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            FolioError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            FolioError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FolioError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Map a sqlx error, turning unique violations into `AlreadyExists`
pub fn map_db_error(context: &str, e: sqlx::Error) -> FolioError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            log::warn!("{}: unique violation: {}", context, db_err);
            return FolioError::AlreadyExists(context.to_string());
        }
    }
    log::error!("{}: {}", context, e);
    FolioError::DatabaseError(format!("{}: {}", context, e))
}
