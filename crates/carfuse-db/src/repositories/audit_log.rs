//! SQL implementation of AuditLogRepository

use async_trait::async_trait;
use tracing::instrument;

use carfuse_core::query::compile_get_by_id;
use carfuse_core::traits::{AuditLogRepository, LogPage, RepoResult};
use carfuse_core::{
    Column, DeletePlan, ExportPlan, ExportRow, LogRecord, NewLogRecord, QueryPlan, SelectPlan,
    SqlParam, Table,
};

use crate::gateway::{CallContext, Operation, SafeExecutionGateway};
use crate::mappers::{export_cells, AuditLogInsert};
use crate::models::{AuditLogModel, LogIdModel};

/// Audit log repository bound to one store's gateway
#[derive(Debug, Clone)]
pub struct SqlAuditLogRepository {
    gateway: SafeExecutionGateway,
}

impl SqlAuditLogRepository {
    /// Create a new SqlAuditLogRepository
    pub fn new(gateway: SafeExecutionGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &SafeExecutionGateway {
        &self.gateway
    }
}

fn table_call() -> CallContext {
    CallContext::for_table(Table::AuditLogs)
}

#[async_trait]
impl AuditLogRepository for SqlAuditLogRepository {
    #[instrument(skip(self, entry), fields(category = %entry.action))]
    async fn create(&self, entry: &NewLogRecord) -> RepoResult<i64> {
        let insert = AuditLogInsert::new(entry);
        let id = self.gateway.insert(Table::AuditLogs, insert.fields()).await?;
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<LogRecord>> {
        let plan = compile_get_by_id(id);
        let rows: Vec<AuditLogModel> = self
            .gateway
            .select_with(table_call(), &plan.sql, &plan.params)
            .await?;

        Ok(rows.into_iter().next().map(LogRecord::from))
    }

    #[instrument(skip(self, plan), fields(page = plan.page, per_page = plan.per_page))]
    async fn search(&self, plan: &SelectPlan) -> RepoResult<LogPage> {
        let rows: Vec<AuditLogModel> = self
            .gateway
            .select_with(table_call(), &plan.query.sql, &plan.query.params)
            .await?;

        let total = if plan.paginated {
            let count = plan.count_plan();
            let total = self.gateway.count(&count.sql, &count.params).await?;
            Some(u64::try_from(total).unwrap_or_default())
        } else {
            None
        };

        Ok(LogPage {
            records: rows.into_iter().map(LogRecord::from).collect(),
            total,
            page: plan.page,
            per_page: plan.per_page,
        })
    }

    #[instrument(skip(self, plan), fields(columns = plan.columns.len(), limit = plan.limit))]
    async fn export_rows(&self, plan: &ExportPlan) -> RepoResult<Vec<ExportRow>> {
        let call = table_call()
            .fields(plan.columns.len())
            .conditions(plan.query.params.len());
        let rows = self
            .gateway
            .fetch_rows(Operation::Export, call, &plan.query.sql, &plan.query.params)
            .await?;

        Ok(rows
            .iter()
            .map(|row| export_cells(row, &plan.columns))
            .collect())
    }

    #[instrument(skip(self, plan), fields(forced = plan.forced))]
    async fn candidate_ids(&self, plan: &DeletePlan) -> RepoResult<Vec<i64>> {
        let call = table_call().with("forced", plan.forced);
        let rows: Vec<LogIdModel> = self
            .gateway
            .select_with(call, &plan.select.sql, &plan.select.params)
            .await?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    #[instrument(skip(self, plan), fields(ids = plan.params.len()))]
    async fn delete_batch(&self, plan: &QueryPlan) -> RepoResult<u64> {
        let call = table_call().conditions(plan.params.len());
        let deleted = self
            .gateway
            .statement(Operation::Delete, call, &plan.sql, &plan.params)
            .await?;
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: i64) -> RepoResult<u64> {
        let affected = self
            .gateway
            .delete(Table::AuditLogs, &[(Column::Id, SqlParam::Int(id))], true)
            .await?;
        Ok(affected)
    }
}
