//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use validator::Validate;

/// New audit log entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLogEntryRequest {
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,

    /// Free-form payload; sensitive keys are redacted before storage
    #[serde(default)]
    pub context: Option<JsonValue>,

    #[validate(range(min = 1, message = "User ID must be positive"))]
    pub user_id: Option<i64>,

    #[validate(range(min = 1, message = "Booking ID must be positive"))]
    pub booking_id: Option<i64>,

    #[validate(range(min = 1, message = "Transaction ID must be positive"))]
    pub transaction_id: Option<i64>,

    #[validate(ip(message = "Invalid IP address"))]
    pub ip_address: Option<String>,

    /// Defaults to `info`
    pub log_level: Option<String>,
}

impl CreateLogEntryRequest {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            context: None,
            user_id: None,
            booking_id: None,
            transaction_id: None,
            ip_address: None,
            log_level: None,
        }
    }
}
