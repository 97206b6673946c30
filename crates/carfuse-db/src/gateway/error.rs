//! Driver error classification and message scrubbing

use std::sync::LazyLock;

use carfuse_core::{ErrorKind, StoreError};
use regex::Regex;
use sqlx::error::ErrorKind as DriverErrorKind;

static DRIVER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error returned from database:\s*").expect("valid regex"));
static SQLSTATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SQLSTATE\[\w+\]:\s*").expect("valid regex"));
/// `1062 (23000): ...` as printed by the MySQL driver
static MYSQL_NATIVE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\s*\(\w{5}\):\s*").expect("valid regex"));
/// `(code: 2067) ...` as printed by the SQLite driver
static SQLITE_CODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(code:\s*\d+\)\s*").expect("valid regex"));
/// `Integrity constraint violation: 1062 ...`
static VENDOR_LABEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][\w ]*?:\s+\d{4}\s+").expect("valid regex"));
static QUOTED_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"near\s+(?:'[^']*'?|"[^"]*"?)"#).expect("valid regex")
});

/// Strip vendor diagnostic prefixes and collapse quoted SQL after `near`
pub fn sanitize_message(message: &str) -> String {
    let mut out = DRIVER_PREFIX.replace_all(message, "").into_owned();
    out = SQLSTATE_PREFIX.replace_all(&out, "").into_owned();
    for prefix in [&*MYSQL_NATIVE_PREFIX, &*SQLITE_CODE_PREFIX, &*VENDOR_LABEL_PREFIX] {
        out = prefix.replace(&out, "").into_owned();
    }
    QUOTED_FRAGMENT
        .replace_all(&out, "near '[SQL]'")
        .trim()
        .to_string()
}

/// Pure classification from the driver's SQLSTATE/vendor code and message
pub fn classify_database_error(
    code: Option<&str>,
    message: &str,
    driver_kind: Option<DriverErrorKind>,
) -> ErrorKind {
    if matches!(
        driver_kind,
        Some(
            DriverErrorKind::UniqueViolation
                | DriverErrorKind::ForeignKeyViolation
                | DriverErrorKind::NotNullViolation
                | DriverErrorKind::CheckViolation
        )
    ) {
        return ErrorKind::ConstraintViolation;
    }

    match code {
        Some(c) if c.starts_with("23") && c.len() == 5 => return ErrorKind::ConstraintViolation,
        Some("42S02" | "42P01") => return ErrorKind::SchemaError,
        Some("42000" | "42601") => return ErrorKind::SyntaxError,
        _ => {}
    }

    let lower = message.to_ascii_lowercase();
    if lower.contains("no such table") || lower.contains("doesn't exist") {
        ErrorKind::SchemaError
    } else if lower.contains("syntax error") || lower.contains("error in your sql syntax") {
        ErrorKind::SyntaxError
    } else if lower.contains("constraint failed") || lower.contains("duplicate entry") {
        ErrorKind::ConstraintViolation
    } else {
        ErrorKind::QueryFailure
    }
}

/// Caller-visible message for a classified failure
fn client_message(kind: ErrorKind, sanitized: &str) -> String {
    match kind {
        ErrorKind::ConstraintViolation => "Duplicate or invalid data".to_string(),
        ErrorKind::SchemaError => "Database schema error".to_string(),
        ErrorKind::SyntaxError => "Database query error".to_string(),
        ErrorKind::QueryFailure | ErrorKind::CompilationRejected => {
            format!("Database query failed: {sanitized}")
        }
    }
}

/// Convert a driver error into the classified, caller-safe form
pub fn classify(err: &sqlx::Error) -> StoreError {
    let (kind, raw) = match err {
        sqlx::Error::Database(db) => {
            let code = db.code();
            let kind = classify_database_error(code.as_deref(), db.message(), Some(db.kind()));
            (kind, db.message().to_string())
        }
        sqlx::Error::RowNotFound => (ErrorKind::QueryFailure, "no rows returned".to_string()),
        sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } => {
            (ErrorKind::SchemaError, err.to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            (ErrorKind::QueryFailure, "connection unavailable".to_string())
        }
        other => (ErrorKind::QueryFailure, other.to_string()),
    };
    StoreError::new(kind, client_message(kind, &sanitize_message(&raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_vendor_prefixes() {
        assert_eq!(
            sanitize_message("error returned from database: 1146 (42S02): Table 'x.audit' doesn't exist"),
            "Table 'x.audit' doesn't exist"
        );
        assert_eq!(
            sanitize_message("SQLSTATE[HY000]: General error: 2006 MySQL server has gone away"),
            "MySQL server has gone away"
        );
        assert_eq!(
            sanitize_message("(code: 1) near \"FORM\": syntax error"),
            "near '[SQL]': syntax error"
        );
    }

    #[test]
    fn test_sanitize_collapses_quoted_sql() {
        let msg = "You have an error in your SQL syntax; check the manual near 'DROP TABLE users' at line 1";
        let clean = sanitize_message(msg);
        assert!(clean.contains("near '[SQL]' at line 1"));
        assert!(!clean.contains("DROP"));
    }

    #[test]
    fn test_classify_by_code() {
        assert_eq!(
            classify_database_error(Some("23000"), "Duplicate entry", None),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(
            classify_database_error(Some("42S02"), "Table missing", None),
            ErrorKind::SchemaError
        );
        assert_eq!(
            classify_database_error(Some("42000"), "bad", None),
            ErrorKind::SyntaxError
        );
        assert_eq!(
            classify_database_error(Some("HY000"), "server has gone away", None),
            ErrorKind::QueryFailure
        );
    }

    #[test]
    fn test_classify_by_driver_kind_and_message() {
        assert_eq!(
            classify_database_error(Some("2067"), "UNIQUE constraint failed: t.c", Some(DriverErrorKind::UniqueViolation)),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(
            classify_database_error(Some("1"), "no such table: audit_logs", Some(DriverErrorKind::Other)),
            ErrorKind::SchemaError
        );
        assert_eq!(
            classify_database_error(Some("1"), "near \"SELEC\": syntax error", Some(DriverErrorKind::Other)),
            ErrorKind::SyntaxError
        );
    }

    #[test]
    fn test_non_database_errors_are_query_failures() {
        let err = classify(&sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::QueryFailure);
        assert_eq!(err.message, "Database query failed: connection unavailable");
        assert_eq!(err.status_code(), 500);
    }
}
