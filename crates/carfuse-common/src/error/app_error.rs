//! Application error types
//!
//! Unified error handling for the entire application.

use carfuse_core::DomainError;
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Compiler rejections and classified store failures
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
            // Classified store errors and compiler rejections carry their own hint
            Self::Domain(e) => e.status_code(),
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        let status = self.status_code();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        let status = self.status_code();
        (500..600).contains(&status)
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            status: err.status_code(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carfuse_core::{CompileError, ErrorKind, StoreError};

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Validation("test".to_string()).status_code(), 400);
        assert_eq!(
            AppError::internal(anyhow::anyhow!("pool closed")).status_code(),
            500
        );
    }

    #[test]
    fn test_domain_store_errors_keep_their_hint() {
        let constraint = AppError::from(DomainError::from(StoreError::new(
            ErrorKind::ConstraintViolation,
            "Duplicate or invalid data",
        )));
        assert_eq!(constraint.status_code(), 400);
        assert_eq!(constraint.error_code(), "CONSTRAINT_VIOLATION");
        assert!(constraint.is_client_error());

        let schema = AppError::from(DomainError::from(StoreError::new(
            ErrorKind::SchemaError,
            "Database schema error",
        )));
        assert_eq!(schema.status_code(), 500);
        assert!(schema.is_server_error());
    }

    #[test]
    fn test_rejected_delete_is_client_error() {
        let err = AppError::from(DomainError::from(CompileError::UnguardedBulkDelete));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "COMPILATION_REJECTED");
    }

    #[test]
    fn test_error_response_hides_internal_detail() {
        let err = AppError::internal(anyhow::anyhow!("mysql://audit:secret@db failed"));
        let response = ErrorResponse::from(&err);

        assert_eq!(response.code, "INTERNAL_ERROR");
        assert_eq!(response.message, "Internal server error");
        assert_eq!(response.status, 500);
        assert!(response.details.is_none());
    }

    #[test]
    fn test_error_response_for_rejection() {
        let response = ErrorResponse::from(AppError::from(DomainError::from(
            CompileError::UnguardedBulkDelete,
        )));
        assert_eq!(response.status, 400);
        assert_eq!(
            response.message,
            "Cannot delete all logs without explicit confirmation"
        );
    }
}
