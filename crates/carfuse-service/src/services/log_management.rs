//! Log management service
//!
//! Creates, searches, exports and deletes audit log entries in the secure store.

use std::path::Path;

use carfuse_core::query::{compile_batch_delete, sanitize_text, FileOutput, IgnoredFilter};
use carfuse_core::{DomainError, ExportRow, FilterSpec, LogLevel, NewLogRecord};
use carfuse_db::sanitize_context;
use chrono::TimeDelta;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{
    CreateLogEntryRequest, ExportResponse, LogEntryResponse, LogListResponse, PaginationMeta,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

const MAX_MESSAGE_LEN: usize = 5000;
const MAX_CATEGORY_LEN: usize = 50;
const EXPORT_DIR_MODE: u32 = 0o750;
const EXPORT_FILE_MODE: u32 = 0o640;

/// Log management service, scoped to one request id
pub struct LogManagementService<'a> {
    ctx: &'a ServiceContext,
    request_id: String,
}

impl<'a> LogManagementService<'a> {
    /// Create a new LogManagementService for `request_id`
    pub fn new(ctx: &'a ServiceContext, request_id: impl Into<String>) -> Self {
        Self {
            ctx,
            request_id: request_id.into(),
        }
    }

    /// Create a service with a freshly generated request id
    pub fn for_new_request(ctx: &'a ServiceContext) -> Self {
        Self::new(ctx, Uuid::new_v4().to_string())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Append an audit entry and return its id
    #[instrument(skip(self, request), fields(request_id = %self.request_id, category = %request.category))]
    pub async fn create_log_entry(&self, request: CreateLogEntryRequest) -> ServiceResult<i64> {
        request.validate()?;

        let log_level = match request.log_level.as_deref() {
            Some(raw) => raw.parse::<LogLevel>().map_err(ServiceError::validation)?,
            None => LogLevel::default(),
        };
        let category = sanitize_text(&request.category, MAX_CATEGORY_LEN);
        let message = sanitize_text(&request.message, MAX_MESSAGE_LEN);
        if category.is_empty() || message.is_empty() {
            return Err(ServiceError::validation(
                "Category and message must contain printable text",
            ));
        }

        let mut details = match request.context {
            Some(value @ JsonValue::Object(_)) => sanitize_context(&value),
            Some(JsonValue::Null) | None => json!({}),
            Some(other) => json!({ "context": sanitize_context(&other) }),
        };
        if let JsonValue::Object(map) = &mut details {
            map.insert(
                "request_id".to_string(),
                JsonValue::String(self.request_id.clone()),
            );
        }

        let mut entry = NewLogRecord::new(category, message, self.ctx.compiler().now());
        entry.details = details;
        entry.user_reference = request.user_id;
        entry.booking_reference = request.booking_id;
        entry.transaction_reference = request.transaction_id;
        entry.ip_address = request.ip_address;
        entry.log_level = log_level;
        entry.request_id = Some(self.request_id.clone());

        let id = self.ctx.audit_repo().create(&entry).await?;

        info!(log_id = id, level = %log_level, "Audit log entry created");

        Ok(id)
    }

    /// Search logs; pagination metadata is omitted when pagination is skipped
    #[instrument(skip(self, filters), fields(request_id = %self.request_id))]
    pub async fn get_logs(&self, filters: &FilterSpec) -> ServiceResult<LogListResponse> {
        let plan = self.ctx.compiler().compile_select(filters);
        self.report_ignored("select", &plan.query.ignored);

        let page = self.ctx.audit_repo().search(&plan).await?;
        let pagination = page
            .total
            .map(|total| PaginationMeta::new(total, page.page, page.per_page));

        Ok(LogListResponse {
            data: page.records.into_iter().map(LogEntryResponse::from).collect(),
            pagination,
        })
    }

    /// Get a single log entry, `None` when absent
    #[instrument(skip(self), fields(request_id = %self.request_id))]
    pub async fn get_log_by_id(&self, id: i64) -> ServiceResult<Option<LogEntryResponse>> {
        let record = self.ctx.audit_repo().find_by_id(id).await?;
        Ok(record.map(LogEntryResponse::from))
    }

    /// Delete matching logs in batches and return the number removed.
    ///
    /// A rejected filter set is returned to the caller and never reaches the store.
    #[instrument(skip(self, filters), fields(request_id = %self.request_id))]
    pub async fn delete_logs(&self, filters: &FilterSpec, force_bulk: bool) -> ServiceResult<u64> {
        let plan = match self.ctx.compiler().compile_delete(filters, force_bulk) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, force_bulk, "Refusing to delete audit logs");
                return Err(DomainError::from(err).into());
            }
        };

        let ids = self.ctx.audit_repo().candidate_ids(&plan).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        info!(count = ids.len(), forced = plan.forced, "Deleting audit logs");

        let batch_size = self.ctx.settings().delete_batch_size.max(1);
        let mut total = 0;
        for batch in ids.chunks(batch_size) {
            let statement = compile_batch_delete(batch).map_err(DomainError::from)?;
            total += self.ctx.audit_repo().delete_batch(&statement).await?;
        }

        Ok(total)
    }

    /// Write matching logs to a CSV file in the export directory
    #[instrument(skip(self, filters), fields(request_id = %self.request_id))]
    pub async fn export_logs(&self, filters: &FilterSpec) -> ServiceResult<ExportResponse> {
        let now = self.ctx.compiler().now();
        let export_id = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), short_hex());
        let file_name = format!("audit_logs_export_{export_id}.csv");
        let export_dir = self.ctx.settings().export_dir.clone();
        let file_path = export_dir.join(&file_name);

        let plan = self.ctx.compiler().compile_export(filters, Some(&file_path));
        self.report_ignored("export", &plan.query.ignored);

        let rows = self.ctx.audit_repo().export_rows(&plan).await?;
        let row_count = rows.len();
        let Some(output) = plan.output else {
            return Err(ServiceError::internal("export plan has no destination"));
        };

        tokio::task::spawn_blocking(move || write_export(&export_dir, &output, &rows))
            .await
            .map_err(|e| ServiceError::internal(e.to_string()))?
            .map_err(|e| {
                error!(error = %e, file = %file_name, "Failed to write audit log export");
                DomainError::ExportFailed(e)
            })?;

        let expiry = TimeDelta::try_hours(self.ctx.settings().export_expiry_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now);

        info!(export_id = %export_id, row_count, "Audit logs exported");

        Ok(ExportResponse {
            file_path: file_path.display().to_string(),
            file_name,
            export_id,
            row_count,
            expiry_time: expiry.and_utc().timestamp(),
            expiry_formatted: expiry.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    fn report_ignored(&self, operation: &'static str, ignored: &[IgnoredFilter]) {
        for filter in ignored {
            debug!(
                operation,
                key = filter.key,
                value = %filter.value,
                reason = filter.reason,
                "Ignoring filter value"
            );
        }
    }
}

/// First 8 hex digits of a random UUID
fn short_hex() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn write_export(dir: &Path, output: &FileOutput, rows: &[ExportRow]) -> Result<(), String> {
    create_export_dir(dir).map_err(|e| format!("cannot create export directory: {e}"))?;
    write_csv(output, rows).map_err(|e| format!("cannot write export file: {e}"))?;
    restrict_file(&output.path).map_err(|e| format!("cannot set export file mode: {e}"))
}

fn create_export_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(EXPORT_DIR_MODE);
    }
    builder.create(dir)
}

fn write_csv(output: &FileOutput, rows: &[ExportRow]) -> csv::Result<()> {
    let terminator = match output.format.line_terminator {
        "\r\n" => csv::Terminator::CRLF,
        other => csv::Terminator::Any(other.bytes().next().unwrap_or(b'\n')),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(output.format.delimiter)
        .quote(output.format.quote)
        .terminator(terminator)
        .from_path(&output.path)?;

    writer.write_record(&output.header)?;
    for row in rows {
        writer.write_record(&row.cells)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg_attr(not(unix), allow(unused_variables))]
fn restrict_file(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXPORT_FILE_MODE))?;
    }
    Ok(())
}
