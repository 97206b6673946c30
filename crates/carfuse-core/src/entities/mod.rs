//! Domain entities

mod audit_log;

pub use audit_log::{ExportRow, LogLevel, LogRecord, NewLogRecord};
