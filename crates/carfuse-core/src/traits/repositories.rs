//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer compiles plans; the infrastructure layer runs them.

use async_trait::async_trait;

use crate::entities::{ExportRow, LogRecord, NewLogRecord};
use crate::error::DomainError;
use crate::query::{DeletePlan, ExportPlan, QueryPlan, SelectPlan};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// One page of audit records
#[derive(Debug, Clone, PartialEq)]
pub struct LogPage {
    pub records: Vec<LogRecord>,
    /// `None` when pagination was skipped and no count query ran
    pub total: Option<u64>,
    pub page: u32,
    pub per_page: u32,
}

// ============================================================================
// Audit Log Repository
// ============================================================================

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append a row and return its generated id
    async fn create(&self, entry: &NewLogRecord) -> RepoResult<i64>;

    /// Find a row by id
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<LogRecord>>;

    /// Run a compiled select (and its count query when paginated)
    async fn search(&self, plan: &SelectPlan) -> RepoResult<LogPage>;

    /// Fetch export rows as text cells in plan column order
    async fn export_rows(&self, plan: &ExportPlan) -> RepoResult<Vec<ExportRow>>;

    /// Ids selected by a guarded delete plan
    async fn candidate_ids(&self, plan: &DeletePlan) -> RepoResult<Vec<i64>>;

    /// Run a compiled batch delete
    async fn delete_batch(&self, plan: &QueryPlan) -> RepoResult<u64>;

    /// Stamp `deleted_at` on one row
    async fn soft_delete(&self, id: i64) -> RepoResult<u64>;
}
