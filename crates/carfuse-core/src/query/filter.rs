//! Filter vocabulary for audit log queries

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use super::plan::{count_placeholders, IgnoredFilter, SqlParam};
use crate::error::CompileError;

/// A filter map was rejected at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown filter key: {0}")]
    UnknownKey(String),

    #[error("Filter key '{0}' is reserved for internal callers")]
    PrivilegedKey(String),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Case-insensitive `asc`/`desc`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extra predicate written by internal code.
///
/// The SQL text must be a `&'static str`, so it can only come from source
/// code, never from request input. It is appended as `AND (<sql>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustedClause {
    sql: &'static str,
    params: Vec<SqlParam>,
}

impl TrustedClause {
    pub fn new(sql: &'static str, params: Vec<SqlParam>) -> Result<Self, CompileError> {
        if sql.trim().is_empty() {
            return Err(CompileError::MissingClause {
                operation: "trusted clause",
                missing: "SQL text",
            });
        }
        let placeholders = count_placeholders(sql);
        if placeholders != params.len() {
            return Err(CompileError::PlaceholderMismatch {
                placeholders,
                params: params.len(),
            });
        }
        Ok(Self { sql, params })
    }

    pub fn sql(&self) -> &'static str {
        self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

/// Which audit rows a query targets, and how to page, sort and project them.
///
/// Deserializing rejects unknown keys, including `custom_where`; a trusted
/// clause can only be attached with [`FilterSpec::with_trusted_clause`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub user_id: Option<i64>,
    pub booking_id: Option<i64>,
    /// Takes precedence over `action`
    pub category: Option<String>,
    pub action: Option<String>,
    pub categories: Vec<String>,
    pub log_level: Option<String>,
    pub log_levels: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub relative_date: Option<String>,
    pub search: Option<String>,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub fields: Vec<String>,
    pub skip_pagination: bool,
    pub limit: Option<i64>,
    pub export_fields: Vec<String>,
    pub header_names: Vec<String>,

    #[serde(skip)]
    trusted: Option<TrustedClause>,
    /// Raw values that could not be parsed at the boundary
    #[serde(skip)]
    malformed: Vec<IgnoredFilter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_booking_id(mut self, booking_id: i64) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_log_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn with_end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    pub fn with_relative_date(mut self, keyword: impl Into<String>) -> Self {
        self.relative_date = Some(keyword.into());
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_page(mut self, page: i64, per_page: i64) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order.as_str().to_string());
        self
    }

    /// Disable pagination; the bulk row cap still applies
    pub fn without_pagination(mut self, limit: Option<i64>) -> Self {
        self.skip_pagination = true;
        self.limit = limit;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_export_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trusted_clause(mut self, clause: TrustedClause) -> Self {
        self.trusted = Some(clause);
        self
    }

    pub fn trusted_clause(&self) -> Option<&TrustedClause> {
        self.trusted.as_ref()
    }

    /// Values dropped while parsing raw input
    pub fn malformed(&self) -> &[IgnoredFilter] {
        &self.malformed
    }

    /// Build from raw query-string pairs.
    ///
    /// A trailing `[]` on a key is ignored and list values may be
    /// comma-separated or repeated. Unknown keys fail; malformed values are
    /// dropped and reported through [`FilterSpec::malformed`].
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let key = key.strip_suffix("[]").unwrap_or(key);
            let value = value.as_ref().trim();
            spec.apply_pair(key, value)?;
        }
        Ok(spec)
    }

    fn apply_pair(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        match key {
            "custom_where" | "custom_params" => {
                return Err(FilterError::PrivilegedKey(key.to_string()))
            }
            "user_id" => self.user_id = self.int_value("user_id", value),
            "booking_id" => self.booking_id = self.int_value("booking_id", value),
            "page" => self.page = self.int_value("page", value),
            "per_page" => self.per_page = self.int_value("per_page", value),
            "limit" => self.limit = self.int_value("limit", value),
            "skip_pagination" => match parse_bool(value) {
                Some(flag) => self.skip_pagination = flag,
                None => self.malformed.push(IgnoredFilter::new(
                    "skip_pagination",
                    value,
                    "not a boolean",
                )),
            },
            "categories" => push_list(&mut self.categories, value),
            "log_levels" => push_list(&mut self.log_levels, value),
            "fields" => push_list(&mut self.fields, value),
            "export_fields" => push_list(&mut self.export_fields, value),
            "header_names" => push_list(&mut self.header_names, value),
            "category" => self.category = text_value(value),
            "action" => self.action = text_value(value),
            "log_level" => self.log_level = text_value(value),
            "start_date" => self.start_date = text_value(value),
            "end_date" => self.end_date = text_value(value),
            "relative_date" => self.relative_date = text_value(value),
            "search" => self.search = text_value(value),
            "request_id" => self.request_id = text_value(value),
            "ip_address" => self.ip_address = text_value(value),
            "sort_field" => self.sort_field = text_value(value),
            "sort_order" => self.sort_order = text_value(value),
            other => return Err(FilterError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    fn int_value(&mut self, key: &'static str, raw: &str) -> Option<i64> {
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.malformed
                    .push(IgnoredFilter::new(key, raw, "not an integer"));
                None
            }
        }
    }
}

fn text_value(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn push_list(target: &mut Vec<String>, raw: &str) {
    target.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
