//! # carfuse-service
//!
//! Application layer containing the audit log management use cases, DTOs,
//! and the startup wiring that connects them to the secure store.

pub mod dto;
pub mod services;

pub use services::{
    LogManagementService, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};
