//! Integration test utilities for the audit log stack
//!
//! This crate provides helpers for running end-to-end tests against
//! in-memory SQLite stores reached through the same driver abstraction
//! used in production.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
