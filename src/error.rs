//! Error types for the library desk

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric status codes carried in every outcome and error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NotFound = 3,
    Duplicate = 4,
    NoCopiesAvailable = 5,
    AlreadyReturned = 6,
    BadValue = 7,
}

impl ErrorCode {
    /// HTTP status used when this code is reported over the JSON API
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Success => StatusCode::OK,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate | ErrorCode::AlreadyReturned => StatusCode::CONFLICT,
            ErrorCode::NoCopiesAvailable => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::BadValue => StatusCode::BAD_REQUEST,
            ErrorCode::Failure | ErrorCode::DbFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    NotFound(String),

    #[error("No copies available")]
    NoCopiesAvailable,

    #[error("Already returned on {return_date}")]
    AlreadyReturned { return_date: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateKey(_) => ErrorCode::Duplicate,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::NoCopiesAvailable => ErrorCode::NoCopiesAvailable,
            AppError::AlreadyReturned { .. } => ErrorCode::AlreadyReturned,
            AppError::InvalidInput(_) => ErrorCode::BadValue,
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DbFailure,
        }
    }

    /// Expected business conditions, reported to the caller as a failed
    /// outcome rather than a hard failure.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateKey(_)
                | AppError::NotFound(_)
                | AppError::NoCopiesAvailable
                | AppError::AlreadyReturned { .. }
                | AppError::InvalidInput(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Surface the first field message, which is written for the librarian.
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid input.".to_string());
        AppError::InvalidInput(message)
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                "Database error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_returned_message_carries_date() {
        let err = AppError::AlreadyReturned {
            return_date: "2024-02-01".to_string(),
        };
        assert_eq!(err.to_string(), "Already returned on 2024-02-01");
        assert_eq!(err.code(), ErrorCode::AlreadyReturned);
        assert!(err.is_business());
    }

    #[test]
    fn test_database_errors_are_hard_failures() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert!(!err.is_business());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
