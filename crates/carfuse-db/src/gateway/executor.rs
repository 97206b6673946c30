//! The safe execution gateway

use std::future::Future;

use carfuse_core::query::TIMESTAMP_FORMAT;
use carfuse_core::{Column, CompileError, ErrorKind, SqlParam, StoreError, Table};
use chrono::Utc;
use serde_json::{Map, Value as JsonValue};
use sqlx::any::{AnyArguments, AnyQueryResult, AnyRow};
use sqlx::AnyPool;
use sqlx::{Arguments, FromRow};
use tracing::{debug, error, info};

use super::context::{CallContext, ExecutionContext, Operation, Outcome};
use super::error::classify;
use crate::mappers::row_to_json;
use crate::pool::StoreTarget;

/// Leading verbs whose statements return rows
const ROW_VERBS: [&str; 6] = ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN", "WITH", "PRAGMA"];

/// Summary of a result for the completion log
pub trait ResultMetadata {
    /// Rows returned or affected, when meaningful
    fn row_count(&self) -> Option<u64>;
}

impl<T> ResultMetadata for Vec<T> {
    fn row_count(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl<T> ResultMetadata for Option<T> {
    fn row_count(&self) -> Option<u64> {
        Some(u64::from(self.is_some()))
    }
}

impl ResultMetadata for u64 {
    fn row_count(&self) -> Option<u64> {
        Some(*self)
    }
}

impl ResultMetadata for i64 {
    fn row_count(&self) -> Option<u64> {
        None
    }
}

impl ResultMetadata for () {
    fn row_count(&self) -> Option<u64> {
        None
    }
}

impl ResultMetadata for AnyQueryResult {
    fn row_count(&self) -> Option<u64> {
        Some(self.rows_affected())
    }
}

/// Output of [`SafeExecutionGateway::raw_query`]
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Rows(Vec<Map<String, JsonValue>>),
    Affected(u64),
}

impl ResultMetadata for RawOutput {
    fn row_count(&self) -> Option<u64> {
        match self {
            Self::Rows(rows) => Some(rows.len() as u64),
            Self::Affected(n) => Some(*n),
        }
    }
}

/// Bind positional parameters in order
fn bind_params(params: &[SqlParam]) -> Result<AnyArguments<'_>, sqlx::Error> {
    let mut args = AnyArguments::default();
    for param in params {
        let added = match param {
            SqlParam::Null => args.add(None::<String>),
            SqlParam::Bool(b) => args.add(*b),
            SqlParam::Int(i) => args.add(*i),
            SqlParam::Float(f) => args.add(*f),
            SqlParam::Text(s) => args.add(s.as_str()),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

fn returns_rows(sql: &str) -> bool {
    let verb = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    ROW_VERBS.contains(&verb.as_str())
}

fn rejected(err: CompileError) -> StoreError {
    StoreError::new(ErrorKind::CompilationRejected, err.to_string())
}

fn assignments(columns: &[(Column, SqlParam)], separator: &str) -> String {
    columns
        .iter()
        .map(|(c, _)| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(separator)
}

fn values(columns: &[(Column, SqlParam)]) -> impl Iterator<Item = SqlParam> + '_ {
    columns.iter().map(|(_, v)| v.clone())
}

/// Wraps every statement against one store with timing, structured logging,
/// context redaction and error classification.
///
/// Holds only the pool handle and the store identity, so clones are cheap and
/// safe to share across tasks.
#[derive(Debug, Clone)]
pub struct SafeExecutionGateway {
    target: StoreTarget,
    pool: AnyPool,
    identity: String,
}

impl SafeExecutionGateway {
    pub fn new(target: StoreTarget, pool: AnyPool, identity: impl Into<String>) -> Self {
        Self {
            target,
            pool,
            identity: identity.into(),
        }
    }

    pub fn target(&self) -> StoreTarget {
        self.target
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Run `work` against this store.
    ///
    /// Emits one start event and then exactly one completion or error event.
    /// Driver errors never escape; they are returned classified and scrubbed.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: Operation,
        description: &str,
        call: CallContext,
        work: F,
    ) -> Result<T, StoreError>
    where
        T: ResultMetadata,
        F: FnOnce(AnyPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut ctx =
            ExecutionContext::begin(operation, &call, self.target, self.identity.as_str());

        debug!(
            operation = %ctx.operation,
            store = %ctx.target,
            database = %ctx.database,
            table = ctx.table_name(),
            fields = ctx.fields,
            conditions = ctx.conditions,
            context = %ctx.context,
            started_at = %ctx.started_at,
            "{description} started"
        );

        match work(self.pool.clone()).await {
            Ok(result) => {
                ctx.finish(Outcome::Success);
                let rows = result.row_count();
                if operation.is_read() {
                    debug!(
                        operation = %ctx.operation,
                        store = %ctx.target,
                        table = ctx.table_name(),
                        rows,
                        outcome = %ctx.outcome_label(),
                        elapsed_ms = ctx.elapsed_ms(),
                        "{description} completed"
                    );
                } else {
                    info!(
                        operation = %ctx.operation,
                        store = %ctx.target,
                        table = ctx.table_name(),
                        rows,
                        outcome = %ctx.outcome_label(),
                        elapsed_ms = ctx.elapsed_ms(),
                        "{description} completed"
                    );
                }
                Ok(result)
            }
            Err(err) => {
                let classified = classify(&err);
                ctx.finish(Outcome::Failed(classified.kind));
                error!(
                    operation = %ctx.operation,
                    store = %ctx.target,
                    database = %ctx.database,
                    table = ctx.table_name(),
                    context = %ctx.context,
                    error = %err,
                    kind = %classified.kind,
                    status = classified.status_code(),
                    sanitized = %classified.message,
                    outcome = %ctx.outcome_label(),
                    elapsed_ms = ctx.elapsed_ms(),
                    "{description} failed"
                );
                Err(classified)
            }
        }
    }

    /// `INSERT` one row and return the generated id
    pub async fn insert(
        &self,
        table: Table,
        fields: &[(Column, SqlParam)],
    ) -> Result<i64, StoreError> {
        if fields.is_empty() {
            return Err(rejected(CompileError::MissingClause {
                operation: "insert",
                missing: "fields",
            }));
        }
        let columns = fields
            .iter()
            .map(|(c, _)| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
        let params: Vec<SqlParam> = values(fields).collect();

        let call = CallContext::for_table(table).fields(fields.len());
        let result = self
            .run(Operation::Insert, "insert", call, &sql, &params)
            .await?;
        result.last_insert_id().ok_or_else(|| {
            StoreError::new(
                ErrorKind::QueryFailure,
                "Database query failed: no generated id returned",
            )
        })
    }

    /// `UPDATE ... SET ... WHERE ...`; an empty WHERE is refused
    pub async fn update(
        &self,
        table: Table,
        fields: &[(Column, SqlParam)],
        conditions: &[(Column, SqlParam)],
    ) -> Result<u64, StoreError> {
        if fields.is_empty() {
            return Err(rejected(CompileError::MissingClause {
                operation: "update",
                missing: "fields",
            }));
        }
        if conditions.is_empty() {
            return Err(rejected(CompileError::MissingClause {
                operation: "update",
                missing: "a WHERE clause",
            }));
        }
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            assignments(fields, ", "),
            assignments(conditions, " AND ")
        );
        let params: Vec<SqlParam> = values(fields).chain(values(conditions)).collect();

        let call = CallContext::for_table(table)
            .fields(fields.len())
            .conditions(conditions.len());
        let result = self
            .run(Operation::Update, "update", call, &sql, &params)
            .await?;
        Ok(result.rows_affected())
    }

    /// Physical delete, or `deleted_at` stamp when `soft`; an empty WHERE is refused
    pub async fn delete(
        &self,
        table: Table,
        conditions: &[(Column, SqlParam)],
        soft: bool,
    ) -> Result<u64, StoreError> {
        if conditions.is_empty() {
            return Err(rejected(CompileError::MissingClause {
                operation: "delete",
                missing: "a WHERE clause",
            }));
        }
        let predicate = assignments(conditions, " AND ");
        let (operation, sql, params) = if soft {
            let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
            let params: Vec<SqlParam> = std::iter::once(SqlParam::Text(now))
                .chain(values(conditions))
                .collect();
            (
                Operation::SoftDelete,
                format!("UPDATE {table} SET {} = ? WHERE {predicate}", Column::DeletedAt),
                params,
            )
        } else {
            (
                Operation::Delete,
                format!("DELETE FROM {table} WHERE {predicate}"),
                values(conditions).collect(),
            )
        };

        let call = CallContext::for_table(table).conditions(conditions.len());
        let result = self
            .run(operation, operation.as_str(), call, &sql, &params)
            .await?;
        Ok(result.rows_affected())
    }

    /// Typed select; rows are logged at debug level only
    pub async fn select<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        self.select_with(CallContext::new(), sql, params).await
    }

    /// [`Self::select`] with caller context for the log events
    pub async fn select_with<T>(
        &self,
        call: CallContext,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let call = call.conditions(params.len());
        self.execute(Operation::Select, "select", call, |pool| async move {
            let args = bind_params(params)?;
            sqlx::query_as_with::<_, T, _>(sql, args)
                .fetch_all(&pool)
                .await
        })
        .await
    }

    /// Untyped rows, for projections only known at runtime
    pub async fn fetch_rows(
        &self,
        operation: Operation,
        call: CallContext,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<AnyRow>, StoreError> {
        self.execute(operation, operation.as_str(), call, |pool| async move {
            let args = bind_params(params)?;
            sqlx::query_with(sql, args).fetch_all(&pool).await
        })
        .await
    }

    /// Single scalar, e.g. `SELECT COUNT(*) ...`
    pub async fn count(&self, sql: &str, params: &[SqlParam]) -> Result<i64, StoreError> {
        let call = CallContext::new().conditions(params.len());
        self.execute(Operation::Count, "count", call, |pool| async move {
            let args = bind_params(params)?;
            sqlx::query_scalar_with::<_, i64, _>(sql, args)
                .fetch_one(&pool)
                .await
        })
        .await
    }

    /// Run a compiled statement and return the affected row count
    pub async fn statement(
        &self,
        operation: Operation,
        call: CallContext,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<u64, StoreError> {
        let result = self
            .run(operation, operation.as_str(), call, sql, params)
            .await?;
        Ok(result.rows_affected())
    }

    /// Ad-hoc statement; the leading verb decides between rows and a count
    pub async fn raw_query(&self, sql: &str, params: &[SqlParam]) -> Result<RawOutput, StoreError> {
        let call = CallContext::new().conditions(params.len());
        self.execute(Operation::Raw, "raw query", call, |pool| async move {
            let args = bind_params(params)?;
            if returns_rows(sql) {
                let rows = sqlx::query_with(sql, args).fetch_all(&pool).await?;
                Ok(RawOutput::Rows(rows.iter().map(row_to_json).collect()))
            } else {
                let result = sqlx::query_with(sql, args).execute(&pool).await?;
                Ok(RawOutput::Affected(result.rows_affected()))
            }
        })
        .await
    }

    async fn run(
        &self,
        operation: Operation,
        description: &str,
        call: CallContext,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<AnyQueryResult, StoreError> {
        self.execute(operation, description, call, |pool| async move {
            let args = bind_params(params)?;
            sqlx::query_with(sql, args).execute(&pool).await
        })
        .await
    }
}
