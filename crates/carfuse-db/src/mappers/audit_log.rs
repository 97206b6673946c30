//! Audit log entity <-> model mapper

use carfuse_core::query::TIMESTAMP_FORMAT;
use carfuse_core::{Column, LogRecord, NewLogRecord, SqlParam};
use chrono::NaiveDateTime;
use serde_json::{Map, Value as JsonValue};

use crate::models::AuditLogModel;

/// Parse a stored timestamp; fractional seconds and a `T` separator are tolerated
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Decode the `details` column; non-JSON text is kept as a string
fn parse_details(raw: Option<String>) -> JsonValue {
    match raw {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        }
        _ => JsonValue::Object(Map::new()),
    }
}

/// Convert AuditLogModel to LogRecord entity
impl From<AuditLogModel> for LogRecord {
    fn from(model: AuditLogModel) -> Self {
        LogRecord {
            id: model.id,
            action: model.action.into(),
            message: model.message.map(String::from),
            details: parse_details(model.details.map(String::from)),
            user_reference: model.user_reference,
            booking_reference: model.booking_reference,
            transaction_reference: model.transaction_reference,
            ip_address: model.ip_address.map(String::from),
            log_level: model.log_level.and_then(|l| l.parse().ok()),
            request_id: model.request_id.map(String::from),
            created_at: model.created_at.as_deref().and_then(parse_timestamp),
            deleted_at: model.deleted_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Column/value pairs for inserting a new audit row
pub struct AuditLogInsert {
    fields: Vec<(Column, SqlParam)>,
}

impl AuditLogInsert {
    pub fn new(entry: &NewLogRecord) -> Self {
        let fields = vec![
            (Column::Action, SqlParam::from(entry.action.as_str())),
            (Column::Message, SqlParam::from(entry.message.as_str())),
            (Column::Details, SqlParam::Text(entry.details.to_string())),
            (Column::UserReference, SqlParam::from(entry.user_reference)),
            (Column::BookingReference, SqlParam::from(entry.booking_reference)),
            (
                Column::TransactionReference,
                SqlParam::from(entry.transaction_reference),
            ),
            (Column::IpAddress, SqlParam::from(entry.ip_address.clone())),
            (Column::LogLevel, SqlParam::from(entry.log_level.as_str())),
            (Column::RequestId, SqlParam::from(entry.request_id.clone())),
            (Column::CreatedAt, SqlParam::from(entry.created_at)),
        ];
        Self { fields }
    }

    pub fn fields(&self) -> &[(Column, SqlParam)] {
        &self.fields
    }
}
