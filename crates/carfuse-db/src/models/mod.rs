//! Database models - SQLx-compatible structs for the audit store

mod audit_log;
mod text;

pub use audit_log::{AuditLogModel, LogIdModel};
pub use text::DbText;
