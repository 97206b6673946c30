//! Per-call execution metadata and context redaction

use std::fmt;
use std::time::{Duration, Instant};

use carfuse_core::{ErrorKind, Table};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::pool::StoreTarget;

/// Replaces every value stored under a sensitive key
pub const REDACTION_MARKER: &str = "***REDACTED***";

const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "secret",
    "credit_card",
    "card_number",
    "cvv",
];

/// Case-insensitive substring match against the sensitive vocabulary
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Copy of `value` with every non-null value under a sensitive key replaced
/// by [`REDACTION_MARKER`], whatever its type.
///
/// Objects and arrays under other keys are walked.
pub fn sanitize_context(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut clean = Map::with_capacity(map.len());
            for (key, inner) in map {
                let redacted = match inner {
                    JsonValue::Null => JsonValue::Null,
                    _ if is_sensitive_key(key) => JsonValue::String(REDACTION_MARKER.to_string()),
                    JsonValue::Object(_) | JsonValue::Array(_) => sanitize_context(inner),
                    _ => inner.clone(),
                };
                clean.insert(key.clone(), redacted);
            }
            JsonValue::Object(clean)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(sanitize_context).collect()),
        other => other.clone(),
    }
}

/// Statement shapes the gateway runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Count,
    Insert,
    Update,
    Delete,
    SoftDelete,
    Export,
    Raw,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::SoftDelete => "soft_delete",
            Self::Export => "export",
            Self::Raw => "raw",
        }
    }

    /// Reads complete at debug level, writes at info
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Select | Self::Count | Self::Export)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed(ErrorKind),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed(kind) => write!(f, "error:{kind}"),
        }
    }
}

/// Caller-supplied description of a call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub table: Option<Table>,
    pub fields: usize,
    pub conditions: usize,
    pub extra: Map<String, JsonValue>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_table(table: Table) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    pub fn fields(mut self, count: usize) -> Self {
        self.fields = count;
        self
    }

    pub fn conditions(mut self, count: usize) -> Self {
        self.conditions = count;
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Metadata for one execution, feeding exactly one completion or error log
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub operation: Operation,
    pub table: Option<Table>,
    pub fields: usize,
    pub conditions: usize,
    /// Redacted copy of the caller context
    pub context: JsonValue,
    pub started_at: DateTime<Utc>,
    pub target: StoreTarget,
    pub database: String,
    started: Instant,
    pub elapsed: Option<Duration>,
    pub outcome: Option<Outcome>,
}

impl ExecutionContext {
    pub fn begin(
        operation: Operation,
        call: &CallContext,
        target: StoreTarget,
        database: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            table: call.table,
            fields: call.fields,
            conditions: call.conditions,
            context: sanitize_context(&JsonValue::Object(call.extra.clone())),
            started_at: Utc::now(),
            target,
            database: database.into(),
            started: Instant::now(),
            elapsed: None,
            outcome: None,
        }
    }

    pub fn finish(&mut self, outcome: Outcome) -> Duration {
        let elapsed = self.started.elapsed();
        self.elapsed = Some(elapsed);
        self.outcome = Some(outcome);
        elapsed
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed
            .unwrap_or_else(|| self.started.elapsed())
            .as_secs_f64()
            * 1000.0
    }

    /// `success`, `error:<KIND>`, or `pending` before [`finish`](Self::finish)
    pub fn outcome_label(&self) -> String {
        self.outcome
            .map_or_else(|| "pending".to_string(), |o| o.to_string())
    }

    pub fn table_name(&self) -> &'static str {
        self.table.map_or("-", Table::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_redaction() {
        let input = json!({"password": "abc", "nested": {"token": "xyz"}});
        assert_eq!(
            sanitize_context(&input),
            json!({"password": "***REDACTED***", "nested": {"token": "***REDACTED***"}})
        );
    }

    #[test]
    fn test_containers_under_sensitive_keys_are_replaced_whole() {
        let input = json!({
            "token": {"access": "xyz", "refresh": "abc"},
            "passwords": ["p1", "p2"],
            "secret": null,
            "meta": {"api_token": {"value": "t"}}
        });
        let clean = sanitize_context(&input);
        assert_eq!(clean["token"], REDACTION_MARKER);
        assert_eq!(clean["passwords"], REDACTION_MARKER);
        assert_eq!(clean["secret"], JsonValue::Null);
        assert_eq!(clean["meta"]["api_token"], REDACTION_MARKER);
        assert!(!clean.to_string().contains("xyz"));
        assert!(!clean.to_string().contains("p1"));
    }

    #[test]
    fn test_keys_match_case_insensitively_and_by_substring() {
        let input = json!({
            "User_Password": "hunter2",
            "ACCESS_TOKEN": "t",
            "cvv": 123,
            "card_number_last4": "4242",
            "action": "login",
            "items": [{"client_secret": "s"}, {"amount": 10}]
        });
        let clean = sanitize_context(&input);
        assert_eq!(clean["User_Password"], REDACTION_MARKER);
        assert_eq!(clean["ACCESS_TOKEN"], REDACTION_MARKER);
        assert_eq!(clean["cvv"], REDACTION_MARKER);
        assert_eq!(clean["card_number_last4"], REDACTION_MARKER);
        assert_eq!(clean["action"], "login");
        assert_eq!(clean["items"][0]["client_secret"], REDACTION_MARKER);
        assert_eq!(clean["items"][1]["amount"], 10);
    }

    #[test]
    fn test_execution_context_redacts_on_begin() {
        let call = CallContext::for_table(Table::AuditLogs)
            .fields(3)
            .with("secret_key", "k")
            .with("user_id", 5);
        let mut ctx = ExecutionContext::begin(
            Operation::Insert,
            &call,
            StoreTarget::Secure,
            "sqlite::memory:",
        );
        assert_eq!(ctx.context["secret_key"], REDACTION_MARKER);
        assert_eq!(ctx.context["user_id"], 5);
        assert_eq!(ctx.table_name(), "audit_logs");

        assert_eq!(ctx.outcome_label(), "pending");
        ctx.finish(Outcome::Failed(ErrorKind::SyntaxError));
        assert!(ctx.elapsed.is_some());
        assert_eq!(ctx.outcome_label(), "error:SYNTAX_ERROR");
    }

    #[test]
    fn test_read_operations() {
        assert!(Operation::Select.is_read());
        assert!(Operation::Count.is_read());
        assert!(!Operation::Insert.is_read());
        assert!(!Operation::SoftDelete.is_read());
    }
}
