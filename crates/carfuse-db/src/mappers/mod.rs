//! Entity to model mappers
//!
//! - `From<AuditLogModel> for LogRecord`: database rows to domain objects
//! - [`AuditLogInsert`]: entity data prepared for the gateway's `insert`
//! - [`row_to_json`] / [`export_cells`]: untyped rows for raw and export paths

mod audit_log;
mod row;

pub use audit_log::{parse_timestamp, AuditLogInsert};
pub use row::{cell_text, decode_cell, export_cells, row_to_json};
