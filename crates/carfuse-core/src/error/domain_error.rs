//! Domain errors - error types for the domain layer

use std::fmt;

use thiserror::Error;

use crate::query::FilterError;

/// Classification shared by compiler rejections and store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate or invalid data (unique, foreign key, not-null, check)
    ConstraintViolation,
    /// A referenced table does not exist
    SchemaError,
    /// The statement could not be parsed by the store
    SyntaxError,
    /// Any other driver failure
    QueryFailure,
    /// The compiler refused to build a plan
    CompilationRejected,
}

impl ErrorKind {
    /// Stable identifier used in logs and API bodies
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::SchemaError => "SCHEMA_ERROR",
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::QueryFailure => "QUERY_FAILURE",
            Self::CompilationRejected => "COMPILATION_REJECTED",
        }
    }

    /// HTTP status hint for callers rendering this error
    pub const fn status_code(self) -> u16 {
        match self {
            Self::ConstraintViolation | Self::CompilationRejected => 400,
            Self::SchemaError | Self::SyntaxError | Self::QueryFailure => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified store failure, safe to hand to external callers.
///
/// `message` never contains vendor diagnostics or SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

/// The compiler refused to produce a plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Cannot delete all logs without explicit confirmation")]
    UnguardedBulkDelete,

    #[error("No IDs provided for deletion")]
    EmptyBatch,

    #[error("Filter '{key}' cannot be applied to a delete: {reason}")]
    InvalidDeleteFilter { key: &'static str, reason: String },

    #[error("Refusing to build {operation} without {missing}")]
    MissingClause {
        operation: &'static str,
        missing: &'static str,
    },

    #[error("Trusted clause has {placeholders} placeholders but {params} parameters")]
    PlaceholderMismatch { placeholders: usize, params: usize },
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Rejected(#[from] CompileError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Filter(_) => "INVALID_FILTER",
            Self::Rejected(_) => ErrorKind::CompilationRejected.as_str(),
            Self::Store(e) => e.kind.as_str(),
            Self::ExportFailed(_) => "EXPORT_FAILED",
        }
    }

    /// Classification, when the error came from the compiler or the store
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rejected(_) => Some(ErrorKind::CompilationRejected),
            Self::Store(e) => Some(e.kind),
            _ => None,
        }
    }

    /// HTTP status hint
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Filter(_) => 400,
            Self::Rejected(_) => ErrorKind::CompilationRejected.status_code(),
            Self::Store(e) => e.status_code(),
            Self::ExportFailed(_) => 500,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Filter(_) | Self::Rejected(_))
    }
}
