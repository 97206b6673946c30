//! # carfuse-core
//!
//! Domain layer for the CarFuse audit log: the log entity, the error taxonomy,
//! the filter-to-SQL compiler, and the repository port implemented by `carfuse-db`.
//! This crate performs no I/O.

pub mod entities;
pub mod error;
pub mod query;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{ExportRow, LogLevel, LogRecord, NewLogRecord};
pub use error::{CompileError, DomainError, ErrorKind, StoreError};
pub use query::{
    Clock, Column, DateBoundary, DateRange, DeletePlan, ExportPlan, FileOutput, FilterError,
    FilterSpec, FixedClock, IgnoredFilter, LogQueryCompiler, QueryLimits, QueryPlan, SelectPlan,
    SharedClock, SortOrder, SqlParam, SystemClock, Table, TrustedClause, WhereClause,
};
pub use traits::{AuditLogRepository, LogPage, RepoResult};
