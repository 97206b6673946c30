//! Data transfer objects for log management requests and responses
//!
//! This module provides:
//! - Request DTOs with validation
//! - Response DTOs for serializing results
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::CreateLogEntryRequest;
pub use responses::{ExportResponse, LogEntryResponse, LogListResponse, PaginationMeta};
