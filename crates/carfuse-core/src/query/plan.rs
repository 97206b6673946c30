//! Compiled query plans

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::dates::TIMESTAMP_FORMAT;
use super::schema::Column;

/// A positional bind value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    /// Empty-ish values that must not count as a real delete filter
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty() || s == "0",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for SqlParam {
    fn from(v: NaiveDateTime) -> Self {
        Self::Text(v.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A filter value the compiler dropped instead of applying
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredFilter {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl IgnoredFilter {
    pub fn new(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self {
            key,
            value: value.into(),
            reason,
        }
    }
}

/// Count `?` placeholders outside single-quoted literals
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_quote = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '?' if !in_quote => count += 1,
            _ => {}
        }
    }
    count
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub ignored: Vec<IgnoredFilter>,
}

impl QueryPlan {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
            ignored: Vec::new(),
        }
    }

    /// Placeholder count equals parameter count
    pub fn is_balanced(&self) -> bool {
        count_placeholders(&self.sql) == self.params.len()
    }
}

/// A compiled WHERE body (without the `WHERE` keyword)
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub ignored: Vec<IgnoredFilter>,
}

impl WhereClause {
    pub const UNFILTERED: &'static str = "1=1";

    /// No filter contributed a predicate
    pub fn is_unfiltered(&self) -> bool {
        self.sql == Self::UNFILTERED
    }

    /// Every bound value is empty or falsy (vacuously true when unfiltered)
    pub fn all_params_falsy(&self) -> bool {
        self.params.iter().all(SqlParam::is_falsy)
    }
}

/// Paginated or capped select
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub query: QueryPlan,
    /// Shares the WHERE text and params of `query`
    pub count_sql: String,
    pub page: u32,
    pub per_page: u32,
    pub paginated: bool,
    /// Row cap applied when pagination is skipped
    pub limit: u32,
    pub sort_field: Column,
    pub sort_order: super::SortOrder,
}

impl SelectPlan {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn count_plan(&self) -> QueryPlan {
        QueryPlan::new(self.count_sql.clone(), self.query.params.clone())
    }
}

/// CSV dialect for file exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub quote: u8,
    pub line_terminator: &'static str,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_terminator: "\n",
        }
    }
}

/// File destination attached to an export plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub format: CsvFormat,
}

/// Export select with its column order and optional file directive
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub query: QueryPlan,
    pub columns: Vec<Column>,
    pub limit: u32,
    pub output: Option<FileOutput>,
}

/// Candidate-id select for a guarded delete
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub select: QueryPlan,
    pub where_clause: WhereClause,
    pub forced: bool,
}
