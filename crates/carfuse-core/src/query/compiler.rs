//! FilterSpec to SQL compilation

use std::path::Path;

use super::dates::{parse_date_filter, resolve_relative_date, Clock, DateBoundary, SystemClock};
use super::filter::{FilterSpec, SortOrder};
use super::plan::{
    DeletePlan, ExportPlan, FileOutput, IgnoredFilter, QueryPlan, SelectPlan, SqlParam,
    WhereClause,
};
use super::schema::{select_list, Column, Table, DEFAULT_EXPORT_COLUMNS};
use super::text::sanitize_search_term;
use crate::entities::LogLevel;
use crate::error::CompileError;

/// Row and page caps applied by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
    /// Cap for selects with pagination disabled
    pub max_bulk_rows: u32,
    /// Cap for exports and unforced delete candidates
    pub max_export_rows: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
            max_bulk_rows: 5000,
            max_export_rows: 10000,
        }
    }
}

/// Stateless compiler; the clock only feeds relative-date buckets.
#[derive(Debug, Clone, Default)]
pub struct LogQueryCompiler<C = SystemClock> {
    limits: QueryLimits,
    clock: C,
}

impl LogQueryCompiler<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> LogQueryCompiler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            limits: QueryLimits::default(),
            clock,
        }
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    /// `1=1` followed by one `AND` predicate per applicable filter
    pub fn compile_where(&self, filters: &FilterSpec) -> WhereClause {
        WhereBuilder::new(filters, self.clock.now()).build()
    }

    /// Count and page queries sharing one WHERE clause
    pub fn compile_select(&self, filters: &FilterSpec) -> SelectPlan {
        let mut where_clause = self.compile_where(filters);
        let (sort_field, sort_order) = resolve_sort(filters, &mut where_clause.ignored);
        let projection = select_projection(filters, &mut where_clause.ignored);

        let page = filters
            .page
            .map_or(1, |p| p.clamp(1, i64::from(u32::MAX)) as u32);
        let max_per_page = self.limits.max_per_page.max(1);
        let per_page = filters.per_page.map_or(
            self.limits.default_per_page.clamp(1, max_per_page),
            |p| p.clamp(1, i64::from(max_per_page)) as u32,
        );
        let limit = bounded_limit(filters.limit, self.limits.max_bulk_rows);

        let table = Table::AuditLogs;
        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM {table} WHERE {}",
            where_clause.sql
        );
        let mut sql = format!(
            "SELECT {projection} FROM {table} WHERE {} ORDER BY {sort_field} {sort_order}",
            where_clause.sql
        );
        let paginated = !filters.skip_pagination;
        if paginated {
            let offset = u64::from(page - 1) * u64::from(per_page);
            sql.push_str(&format!(" LIMIT {per_page} OFFSET {offset}"));
        } else {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        SelectPlan {
            query: QueryPlan {
                sql,
                params: where_clause.params,
                ignored: where_clause.ignored,
            },
            count_sql,
            page,
            per_page,
            paginated,
            limit,
            sort_field,
            sort_order,
        }
    }

    /// Capped export select; `destination` adds a header row and CSV directive
    pub fn compile_export(&self, filters: &FilterSpec, destination: Option<&Path>) -> ExportPlan {
        let mut where_clause = self.compile_where(filters);
        let (sort_field, sort_order) = resolve_sort(filters, &mut where_clause.ignored);

        let mut columns = Vec::new();
        for name in &filters.export_fields {
            match Column::parse_export(name) {
                Some(column) if !columns.contains(&column) => columns.push(column),
                Some(_) => {}
                None => where_clause.ignored.push(IgnoredFilter::new(
                    "export_fields",
                    name.as_str(),
                    "not an exportable column",
                )),
            }
        }
        if columns.is_empty() {
            columns = DEFAULT_EXPORT_COLUMNS.to_vec();
        }

        let limit = bounded_limit(filters.limit, self.limits.max_export_rows);
        let projection = columns
            .iter()
            .map(|c| c.export_expression())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {projection} FROM {} WHERE {} ORDER BY {sort_field} {sort_order} LIMIT {limit}",
            Table::AuditLogs,
            where_clause.sql
        );

        let output = destination.map(|path| {
            let header = if !filters.header_names.is_empty()
                && filters.header_names.len() == columns.len()
            {
                filters.header_names.clone()
            } else {
                columns.iter().map(|c| c.export_header().to_string()).collect()
            };
            FileOutput {
                path: path.to_path_buf(),
                header,
                format: Default::default(),
            }
        });

        ExportPlan {
            query: QueryPlan {
                sql,
                params: where_clause.params,
                ignored: where_clause.ignored,
            },
            columns,
            limit,
            output,
        }
    }

    /// Guarded delete: selects candidate ids, never deletes directly.
    ///
    /// Fails when any filter value was unusable, or when the WHERE clause is
    /// unfiltered or all-falsy and `force_bulk` is not set.
    pub fn compile_delete(
        &self,
        filters: &FilterSpec,
        force_bulk: bool,
    ) -> Result<DeletePlan, CompileError> {
        let where_clause = self.compile_where(filters);

        if let Some(bad) = where_clause.ignored.first() {
            return Err(CompileError::InvalidDeleteFilter {
                key: bad.key,
                reason: format!("{} ({})", bad.reason, bad.value),
            });
        }
        if (where_clause.is_unfiltered() || where_clause.all_params_falsy()) && !force_bulk {
            return Err(CompileError::UnguardedBulkDelete);
        }

        let mut sql = format!("SELECT id FROM {} WHERE {}", Table::AuditLogs, where_clause.sql);
        if !force_bulk {
            sql.push_str(&format!(" LIMIT {}", self.limits.max_export_rows.max(1)));
        }

        Ok(DeletePlan {
            select: QueryPlan::new(sql, where_clause.params.clone()),
            where_clause,
            forced: force_bulk,
        })
    }
}

/// `DELETE ... WHERE id IN (?, ...)` for a non-empty id list
pub fn compile_batch_delete(ids: &[i64]) -> Result<QueryPlan, CompileError> {
    if ids.is_empty() {
        return Err(CompileError::EmptyBatch);
    }
    let sql = format!(
        "DELETE FROM {} WHERE id IN ({})",
        Table::AuditLogs,
        placeholders(ids.len())
    );
    Ok(QueryPlan::new(
        sql,
        ids.iter().copied().map(SqlParam::Int).collect(),
    ))
}

pub fn compile_get_by_id(id: i64) -> QueryPlan {
    QueryPlan::new(
        format!(
            "SELECT {} FROM {} WHERE id = ? LIMIT 1",
            select_list(&Column::ALL),
            Table::AuditLogs
        ),
        vec![SqlParam::Int(id)],
    )
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn bounded_limit(requested: Option<i64>, cap: u32) -> u32 {
    let cap = cap.max(1);
    requested.map_or(cap, |l| l.clamp(1, i64::from(cap)) as u32)
}

fn resolve_sort(filters: &FilterSpec, ignored: &mut Vec<IgnoredFilter>) -> (Column, SortOrder) {
    let field = match filters.sort_field.as_deref() {
        Some(name) => Column::parse_sortable(name).unwrap_or_else(|| {
            ignored.push(IgnoredFilter::new("sort_field", name, "not a sortable column"));
            Column::CreatedAt
        }),
        None => Column::CreatedAt,
    };
    let order = match filters.sort_order.as_deref() {
        Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
            ignored.push(IgnoredFilter::new("sort_order", raw, "expected ASC or DESC"));
            SortOrder::Desc
        }),
        None => SortOrder::Desc,
    };
    (field, order)
}

fn select_projection(filters: &FilterSpec, ignored: &mut Vec<IgnoredFilter>) -> String {
    let mut columns: Vec<Column> = Vec::new();
    for name in &filters.fields {
        match Column::parse(name) {
            Some(column) if !columns.contains(&column) => columns.push(column),
            Some(_) => {}
            None => ignored.push(IgnoredFilter::new("fields", name.as_str(), "not a column")),
        }
    }
    if columns.is_empty() {
        return select_list(&Column::ALL);
    }
    select_list(&columns)
}

struct WhereBuilder<'a> {
    filters: &'a FilterSpec,
    now: chrono::NaiveDateTime,
    sql: String,
    params: Vec<SqlParam>,
    ignored: Vec<IgnoredFilter>,
}

impl<'a> WhereBuilder<'a> {
    fn new(filters: &'a FilterSpec, now: chrono::NaiveDateTime) -> Self {
        Self {
            filters,
            now,
            sql: WhereClause::UNFILTERED.to_string(),
            params: Vec::new(),
            ignored: filters.malformed().to_vec(),
        }
    }

    fn push(&mut self, predicate: &str, params: impl IntoIterator<Item = SqlParam>) {
        self.sql.push_str(" AND ");
        self.sql.push_str(predicate);
        self.params.extend(params);
    }

    fn equals(&mut self, column: Column, value: SqlParam) {
        self.push(&format!("{column} = ?"), [value]);
    }

    fn within(&mut self, column: Column, values: Vec<SqlParam>) {
        if values.is_empty() {
            return;
        }
        let predicate = format!("{column} IN ({})", placeholders(values.len()));
        self.push(&predicate, values);
    }

    fn ignore(&mut self, key: &'static str, value: impl Into<String>, reason: &'static str) {
        self.ignored.push(IgnoredFilter::new(key, value, reason));
    }

    fn reference(&mut self, key: &'static str, column: Column, value: Option<i64>) {
        match value {
            Some(id) if id > 0 => self.equals(column, SqlParam::Int(id)),
            Some(id) => self.ignore(key, id.to_string(), "must be a positive id"),
            None => {}
        }
    }

    fn level(&mut self, key: &'static str, raw: &str) -> Option<SqlParam> {
        match raw.parse::<LogLevel>() {
            Ok(level) => Some(SqlParam::from(level.as_str())),
            Err(_) => {
                self.ignore(key, raw, "unknown log level");
                None
            }
        }
    }

    fn build(mut self) -> WhereClause {
        let f = self.filters;

        self.reference("user_id", Column::UserReference, f.user_id);
        self.reference("booking_id", Column::BookingReference, f.booking_id);

        if let Some(category) = non_empty(&f.category).or_else(|| non_empty(&f.action)) {
            self.equals(Column::Action, SqlParam::from(category));
        }

        let categories = f
            .categories
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| SqlParam::from(c.as_str()))
            .collect();
        self.within(Column::Action, categories);

        if let Some(raw) = non_empty(&f.log_level) {
            if let Some(level) = self.level("log_level", raw) {
                self.equals(Column::LogLevel, level);
            }
        }

        let levels = f
            .log_levels
            .iter()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| self.level("log_levels", l))
            .collect::<Vec<_>>();
        self.within(Column::LogLevel, levels);

        if let Some(raw) = non_empty(&f.start_date) {
            match parse_date_filter(raw, DateBoundary::Start) {
                Some(start) => self.push("created_at >= ?", [SqlParam::from(start)]),
                None => self.ignore("start_date", raw, "unrecognised date"),
            }
        }
        if let Some(raw) = non_empty(&f.end_date) {
            match parse_date_filter(raw, DateBoundary::End) {
                Some(end) => self.push("created_at <= ?", [SqlParam::from(end)]),
                None => self.ignore("end_date", raw, "unrecognised date"),
            }
        }
        if let Some(keyword) = non_empty(&f.relative_date) {
            match resolve_relative_date(keyword, self.now) {
                Some(range) => self.push(
                    "created_at BETWEEN ? AND ?",
                    [SqlParam::from(range.start), SqlParam::from(range.end)],
                ),
                None => self.ignore("relative_date", keyword, "unknown relative date"),
            }
        }

        if let Some(raw) = non_empty(&f.search) {
            let term = sanitize_search_term(raw);
            if term.is_empty() {
                self.ignore("search", raw, "empty after sanitization");
            } else {
                let pattern = format!("%{term}%");
                self.push(
                    "(message LIKE ? OR details LIKE ?)",
                    [SqlParam::from(pattern.as_str()), SqlParam::from(pattern)],
                );
            }
        }

        if let Some(request_id) = non_empty(&f.request_id) {
            self.equals(Column::RequestId, SqlParam::from(request_id));
        }
        if let Some(ip) = non_empty(&f.ip_address) {
            self.equals(Column::IpAddress, SqlParam::from(ip));
        }

        if let Some(clause) = f.trusted_clause() {
            self.push(&format!("({})", clause.sql()), clause.params().to_vec());
        }

        WhereClause {
            sql: self.sql,
            params: self.params,
            ignored: self.ignored,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
