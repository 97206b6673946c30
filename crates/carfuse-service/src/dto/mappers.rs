//! Entity to DTO mappers

use carfuse_core::query::TIMESTAMP_FORMAT;
use carfuse_core::LogRecord;
use chrono::NaiveDateTime;

use super::responses::LogEntryResponse;

fn format_timestamp(at: Option<NaiveDateTime>) -> Option<String> {
    at.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

impl From<LogRecord> for LogEntryResponse {
    fn from(record: LogRecord) -> Self {
        Self {
            id: record.id,
            category: record.action,
            message: record.message,
            details: record.details,
            user_id: record.user_reference,
            booking_id: record.booking_reference,
            transaction_id: record.transaction_reference,
            ip_address: record.ip_address,
            log_level: record.log_level.map(|l| l.as_str().to_string()),
            request_id: record.request_id,
            created_at: format_timestamp(record.created_at),
            deleted_at: format_timestamp(record.deleted_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carfuse_core::LogLevel;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_record_to_response() {
        let record = LogRecord {
            id: 12,
            action: "booking".to_string(),
            message: Some("Booking created".to_string()),
            details: json!({"request_id": "abc"}),
            user_reference: Some(4),
            booking_reference: Some(99),
            transaction_reference: None,
            ip_address: None,
            log_level: Some(LogLevel::Notice),
            request_id: Some("abc".to_string()),
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0),
            deleted_at: None,
        };
        let response = LogEntryResponse::from(record);
        assert_eq!(response.category, "booking");
        assert_eq!(response.booking_id, Some(99));
        assert_eq!(response.log_level.as_deref(), Some("notice"));
        assert_eq!(response.created_at.as_deref(), Some("2024-06-01 12:00:00"));

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("deleted_at").is_none());
    }
}
