//! Business logic services
//!
//! Log management use cases built on the query compiler and the secure
//! store's gateway.

pub mod context;
pub mod error;
pub mod log_management;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use log_management::LogManagementService;
