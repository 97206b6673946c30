//! Audit log database model

use sqlx::FromRow;

use super::DbText;

/// Database model for the audit_logs table.
///
/// Every field defaults so that plans projecting a subset of columns still
/// decode. Timestamps arrive as text through `CAST(... AS CHAR)`.
#[derive(Debug, Clone, Default, FromRow)]
#[sqlx(default)]
pub struct AuditLogModel {
    pub id: i64,
    pub action: DbText,
    pub message: Option<DbText>,
    /// JSON document
    pub details: Option<DbText>,
    pub user_reference: Option<i64>,
    pub booking_reference: Option<i64>,
    pub transaction_reference: Option<i64>,
    pub ip_address: Option<DbText>,
    pub log_level: Option<DbText>,
    pub request_id: Option<DbText>,
    pub created_at: Option<DbText>,
    pub deleted_at: Option<DbText>,
}

/// `SELECT id ...` rows from a guarded delete plan
#[derive(Debug, Clone, Copy, FromRow)]
pub struct LogIdModel {
    pub id: i64,
}
