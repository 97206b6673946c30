//! Identifier allow-list for the audit store

use std::fmt;

/// Tables the compiler and gateway may name in SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    AuditLogs,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuditLogs => "audit_logs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns of `audit_logs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Action,
    Message,
    Details,
    UserReference,
    BookingReference,
    TransactionReference,
    IpAddress,
    LogLevel,
    RequestId,
    CreatedAt,
    DeletedAt,
}

/// Projection used by exports when the caller does not pick columns
pub const DEFAULT_EXPORT_COLUMNS: [Column; 10] = [
    Column::Id,
    Column::Action,
    Column::LogLevel,
    Column::Message,
    Column::UserReference,
    Column::BookingReference,
    Column::IpAddress,
    Column::CreatedAt,
    Column::RequestId,
    Column::Details,
];

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Id,
        Column::Action,
        Column::Message,
        Column::Details,
        Column::UserReference,
        Column::BookingReference,
        Column::TransactionReference,
        Column::IpAddress,
        Column::LogLevel,
        Column::RequestId,
        Column::CreatedAt,
        Column::DeletedAt,
    ];

    /// Columns accepted as `sort_field`
    pub const SORTABLE: [Column; 7] = [
        Column::Id,
        Column::Action,
        Column::Message,
        Column::UserReference,
        Column::BookingReference,
        Column::CreatedAt,
        Column::LogLevel,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Action => "action",
            Self::Message => "message",
            Self::Details => "details",
            Self::UserReference => "user_reference",
            Self::BookingReference => "booking_reference",
            Self::TransactionReference => "transaction_reference",
            Self::IpAddress => "ip_address",
            Self::LogLevel => "log_level",
            Self::RequestId => "request_id",
            Self::CreatedAt => "created_at",
            Self::DeletedAt => "deleted_at",
        }
    }

    /// Name the column takes in export output
    pub const fn export_alias(self) -> &'static str {
        match self {
            Self::Action => "category",
            Self::UserReference => "user_id",
            Self::BookingReference => "booking_id",
            Self::TransactionReference => "transaction_id",
            other => other.as_str(),
        }
    }

    /// Human-readable CSV header
    pub const fn export_header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Action => "Category",
            Self::Message => "Message",
            Self::Details => "Details",
            Self::UserReference => "User ID",
            Self::BookingReference => "Booking ID",
            Self::TransactionReference => "Transaction ID",
            Self::IpAddress => "IP Address",
            Self::LogLevel => "Log Level",
            Self::RequestId => "Request ID",
            Self::CreatedAt => "Created At",
            Self::DeletedAt => "Deleted At",
        }
    }

    /// Timestamp columns; MySQL reports them with a type the Any driver rejects
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::CreatedAt | Self::DeletedAt)
    }

    /// Select expression for typed reads; timestamps are read back as text
    pub fn select_expression(self) -> String {
        let name = self.as_str();
        if self.is_temporal() {
            format!("CAST({name} AS CHAR) AS {name}")
        } else {
            name.to_string()
        }
    }

    /// Select expression for exports, e.g. `action AS category`
    pub fn export_expression(self) -> String {
        let name = self.as_str();
        let alias = self.export_alias();
        if self.is_temporal() {
            format!("CAST({name} AS CHAR) AS {alias}")
        } else if name == alias {
            name.to_string()
        } else {
            format!("{name} AS {alias}")
        }
    }

    /// Exact match on the column name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Column name or its export alias
    pub fn parse_export(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name || c.export_alias() == name)
    }

    /// Column name restricted to the sortable set
    pub fn parse_sortable(name: &str) -> Option<Self> {
        Self::parse(name).filter(|c| c.is_sortable())
    }

    pub fn is_sortable(self) -> bool {
        Self::SORTABLE.contains(&self)
    }
}

/// Comma-separated select list for typed reads
pub fn select_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.select_expression())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_allow_list() {
        assert_eq!(Column::parse_sortable("created_at"), Some(Column::CreatedAt));
        assert_eq!(Column::parse_sortable("log_level"), Some(Column::LogLevel));
        assert_eq!(Column::parse_sortable("details"), None);
        assert_eq!(Column::parse_sortable("id; DROP TABLE x"), None);
        assert_eq!(Column::parse_sortable("CREATED_AT"), None);
    }

    #[test]
    fn test_export_aliases() {
        assert_eq!(Column::Action.export_expression(), "action AS category");
        assert_eq!(Column::Id.export_expression(), "id");
        assert_eq!(Column::parse_export("user_id"), Some(Column::UserReference));
        assert_eq!(Column::parse_export("booking_reference"), Some(Column::BookingReference));
        assert_eq!(
            Column::CreatedAt.export_expression(),
            "CAST(created_at AS CHAR) AS created_at"
        );
    }

    #[test]
    fn test_timestamps_are_read_as_text() {
        assert_eq!(Column::Message.select_expression(), "message");
        assert_eq!(
            select_list(&[Column::Id, Column::CreatedAt, Column::DeletedAt]),
            "id, CAST(created_at AS CHAR) AS created_at, CAST(deleted_at AS CHAR) AS deleted_at"
        );
    }
}
