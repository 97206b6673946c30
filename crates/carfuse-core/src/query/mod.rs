//! Filter-to-SQL compiler for the audit log store
//!
//! Turns a [`FilterSpec`] into SQL text plus an ordered list of positional
//! parameters. Only identifiers from the closed [`Table`]/[`Column`] sets are
//! ever written into SQL text; every caller-supplied value is bound.

mod compiler;
mod dates;
mod filter;
mod plan;
mod schema;
mod text;

pub use compiler::{compile_batch_delete, compile_get_by_id, LogQueryCompiler, QueryLimits};
pub use dates::{
    parse_date_filter, resolve_relative_date, Clock, DateBoundary, DateRange, FixedClock,
    SharedClock, SystemClock, TIMESTAMP_FORMAT,
};
pub use filter::{FilterError, FilterSpec, SortOrder, TrustedClause};
pub use plan::{
    count_placeholders, CsvFormat, DeletePlan, ExportPlan, FileOutput, IgnoredFilter, QueryPlan,
    SelectPlan, SqlParam, WhereClause,
};
pub use schema::{select_list, Column, Table, DEFAULT_EXPORT_COLUMNS};
pub use text::{sanitize_search_term, sanitize_text};
