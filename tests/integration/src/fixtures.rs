//! Test fixtures and data generators
//!
//! Provides reusable audit entries for integration tests.

use anyhow::Result;
use carfuse_core::query::TIMESTAMP_FORMAT;
use carfuse_core::{Column, SqlParam, Table};
use carfuse_db::SafeExecutionGateway;
use carfuse_service::dto::CreateLogEntryRequest;
use chrono::NaiveDateTime;
use serde_json::json;

/// Entry request with a user reference and a context carrying a secret
pub fn login_request(user_id: i64) -> CreateLogEntryRequest {
    CreateLogEntryRequest {
        context: Some(json!({"method": "password", "password": "hunter2"})),
        user_id: Some(user_id),
        ip_address: Some("198.51.100.7".to_string()),
        ..CreateLogEntryRequest::new("auth", "User logged in")
    }
}

/// Raw row with an explicit timestamp, bypassing the service clock
#[derive(Debug, Clone)]
pub struct SeedRow {
    pub category: &'static str,
    pub message: String,
    pub user_id: Option<i64>,
    pub booking_id: Option<i64>,
    pub log_level: &'static str,
    pub created_at: NaiveDateTime,
}

impl SeedRow {
    pub fn new(category: &'static str, message: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            category,
            message: message.into(),
            user_id: None,
            booking_id: None,
            log_level: "info",
            created_at,
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn booking(mut self, booking_id: i64) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    pub fn level(mut self, level: &'static str) -> Self {
        self.log_level = level;
        self
    }

    pub async fn insert(&self, gateway: &SafeExecutionGateway) -> Result<i64> {
        let id = gateway
            .insert(
                Table::AuditLogs,
                &[
                    (Column::Action, SqlParam::from(self.category)),
                    (Column::Message, SqlParam::from(self.message.as_str())),
                    (Column::Details, SqlParam::from("{}")),
                    (Column::UserReference, SqlParam::from(self.user_id)),
                    (Column::BookingReference, SqlParam::from(self.booking_id)),
                    (Column::LogLevel, SqlParam::from(self.log_level)),
                    (
                        Column::CreatedAt,
                        SqlParam::Text(self.created_at.format(TIMESTAMP_FORMAT).to_string()),
                    ),
                ],
            )
            .await?;
        Ok(id)
    }
}

/// Insert every row, returning the ids in order
pub async fn seed(gateway: &SafeExecutionGateway, rows: &[SeedRow]) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.insert(gateway).await?);
    }
    Ok(ids)
}
