//! Response DTOs
//!
//! All response DTOs implement `Serialize` for JSON output.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// One audit log row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntryResponse {
    pub id: i64,
    pub category: String,
    pub message: Option<String>,
    pub details: JsonValue,
    pub user_id: Option<i64>,
    pub booking_id: Option<i64>,
    pub transaction_id: Option<i64>,
    pub ip_address: Option<String>,
    pub log_level: Option<String>,
    pub request_id: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Offset pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u64,
    /// 1-based index of the first row on this page, 0 when nothing matched
    pub from: u64,
    pub to: u64,
}

impl PaginationMeta {
    pub fn new(total: u64, current_page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let start = u64::from(current_page.saturating_sub(1)) * u64::from(per_page);
        Self {
            total,
            per_page,
            current_page,
            last_page: total.div_ceil(u64::from(per_page)),
            from: if total == 0 { 0 } else { start + 1 },
            to: (start + u64::from(per_page)).min(total),
        }
    }
}

/// Result of a log search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogListResponse {
    pub data: Vec<LogEntryResponse>,
    /// Absent when pagination was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

/// Location and lifetime of a written export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResponse {
    pub file_path: String,
    pub file_name: String,
    pub export_id: String,
    pub row_count: usize,
    /// Unix timestamp after which the file may be purged
    pub expiry_time: i64,
    pub expiry_formatted: String,
}
