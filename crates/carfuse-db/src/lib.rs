//! # carfuse-db
//!
//! Database layer for the audit log core.
//!
//! ## Overview
//!
//! - Connection pools for the two target stores (application and secure)
//! - [`SafeExecutionGateway`]: the only path to a store, wrapping every
//!   statement with timing, structured logging, context redaction and error
//!   classification
//! - Database models with SQLx `FromRow` derives and model ↔ entity mappers
//! - [`SqlAuditLogRepository`], the SQL implementation of
//!   `carfuse_core::AuditLogRepository`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carfuse_common::AppConfig;
//! use carfuse_db::{Gateways, SqlAuditLogRepository, StoreTarget};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let gateways = Gateways::connect(&config).await?;
//!     let repo = SqlAuditLogRepository::new(gateways.get(StoreTarget::Secure).clone());
//!     Ok(())
//! }
//! ```

pub mod gateway;
pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use gateway::{
    sanitize_context, CallContext, ExecutionContext, Gateways, Operation, Outcome, RawOutput,
    ResultMetadata, SafeExecutionGateway, REDACTION_MARKER,
};
pub use pool::{create_pool, database_identity, AnyPool, ConnectError, StoreTarget};
pub use repositories::SqlAuditLogRepository;
