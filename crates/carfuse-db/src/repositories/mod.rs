//! Repository implementations
//!
//! SQL implementations of the repository traits defined in carfuse-core.
//! Every statement runs through a [`crate::SafeExecutionGateway`].

mod audit_log;

pub use audit_log::SqlAuditLogRepository;
