//! Audit log entity - one row of the append-mostly audit store

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Severity recorded with every audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Value stored in the `log_level` column
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "notice" => Ok(Self::Notice),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("Unknown log level: {other}")),
        }
    }
}

/// A persisted audit log row.
///
/// Every column except `id` is optional because select plans may project a
/// subset of columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub id: i64,
    /// Event category (stored in the `action` column)
    pub action: String,
    pub message: Option<String>,
    /// Structured payload, decoded from the JSON text column
    pub details: JsonValue,
    pub user_reference: Option<i64>,
    pub booking_reference: Option<i64>,
    pub transaction_reference: Option<i64>,
    pub ip_address: Option<String>,
    pub log_level: Option<LogLevel>,
    pub request_id: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
}

impl LogRecord {
    /// Category is the public name of the `action` column
    #[inline]
    pub fn category(&self) -> &str {
        &self.action
    }

    /// Check if the row has been soft-deleted
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Payload for appending a new audit row
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogRecord {
    pub action: String,
    pub message: String,
    pub details: JsonValue,
    pub user_reference: Option<i64>,
    pub booking_reference: Option<i64>,
    pub transaction_reference: Option<i64>,
    pub ip_address: Option<String>,
    pub log_level: LogLevel,
    pub request_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewLogRecord {
    /// Create an entry with an empty details payload
    pub fn new(action: impl Into<String>, message: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            details: JsonValue::Object(serde_json::Map::new()),
            user_reference: None,
            booking_reference: None,
            transaction_reference: None,
            ip_address: None,
            log_level: LogLevel::default(),
            request_id: None,
            created_at,
        }
    }
}

/// One exported row, rendered as text cells in export-column order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportRow {
    pub cells: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_log_level_round_trip_names() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" error ".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::Critical.as_str(), "critical");
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_new_log_record_defaults() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let entry = NewLogRecord::new("booking", "Booking created", at);
        assert_eq!(entry.log_level, LogLevel::Info);
        assert!(entry.details.as_object().unwrap().is_empty());
        assert!(entry.user_reference.is_none());
    }
}
