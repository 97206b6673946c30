//! Test helpers for integration tests
//!
//! Provides in-memory stores, a fixed clock and a wired service context.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use carfuse_common::{try_init_tracing_with_config, AppConfig, AuditConfig, TracingConfig};
use carfuse_core::{FixedClock, SharedClock};
use carfuse_db::{Gateways, RawOutput, SafeExecutionGateway, StoreTarget};
use carfuse_service::{LogManagementService, ServiceContext, ServiceContextBuilder};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

/// Schema of the audit table in the secure store
pub const AUDIT_LOGS_DDL: &str = r"
CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action TEXT NOT NULL,
    message TEXT NULL,
    details TEXT NULL,
    user_reference INTEGER NULL,
    booking_reference INTEGER NULL,
    transaction_reference INTEGER NULL,
    ip_address TEXT NULL,
    log_level TEXT NOT NULL DEFAULT 'info',
    request_id TEXT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT NULL
)";

/// Wall-clock time every test store sees: 2024-05-15 12:00:00
pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 15)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Environment for two single-connection in-memory stores.
///
/// One connection per pool keeps each in-memory database alive and shared.
pub fn test_config(export_dir: &std::path::Path) -> Result<AppConfig> {
    let vars: HashMap<&str, String> = [
        ("APP_NAME", "carfuse-test".to_string()),
        ("APP_ENV", "development".to_string()),
        ("DB_URL", "sqlite::memory:".to_string()),
        ("DB_MAX_CONNECTIONS", "1".to_string()),
        ("SECURE_DB_URL", "sqlite::memory:".to_string()),
        ("SECURE_DB_MAX_CONNECTIONS", "1".to_string()),
        ("AUDIT_DELETE_BATCH_SIZE", "2".to_string()),
        ("AUDIT_EXPORT_DIR", export_dir.display().to_string()),
    ]
    .into_iter()
    .collect();

    Ok(AppConfig::from_lookup(|key| vars.get(key).cloned())?)
}

/// Create the audit table through the gateway
pub async fn create_schema(gateway: &SafeExecutionGateway) -> Result<()> {
    match gateway.raw_query(AUDIT_LOGS_DDL, &[]).await? {
        RawOutput::Affected(_) => Ok(()),
        RawOutput::Rows(_) => anyhow::bail!("schema statement returned rows"),
    }
}

/// Both stores plus a service context bound to the secure one
pub struct TestStores {
    pub gateways: Gateways,
    pub ctx: ServiceContext,
    pub settings: AuditConfig,
    pub export_dir: TempDir,
}

impl TestStores {
    /// Connect, create the schema and fix the clock at [`test_now`]
    pub async fn start() -> Result<Self> {
        Self::start_with_clock(Arc::new(FixedClock(test_now()))).await
    }

    pub async fn start_with_clock(clock: SharedClock) -> Result<Self> {
        let export_dir = tempfile::tempdir()?;
        let config = test_config(&export_dir.path().join("secure_exports"))?;
        // only the first test in a binary installs the subscriber
        let _ = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env));
        let gateways = Gateways::connect(&config).await?;
        create_schema(gateways.get(StoreTarget::Secure)).await?;

        let ctx = ServiceContextBuilder::new()
            .gateways(gateways.clone())
            .settings(config.audit.clone())
            .clock(clock)
            .build()?;

        Ok(Self {
            gateways,
            ctx,
            settings: config.audit,
            export_dir,
        })
    }

    pub fn secure(&self) -> &SafeExecutionGateway {
        self.gateways.get(StoreTarget::Secure)
    }

    pub fn application(&self) -> &SafeExecutionGateway {
        self.gateways.get(StoreTarget::Application)
    }

    pub fn service(&self) -> LogManagementService<'_> {
        LogManagementService::new(&self.ctx, "req-test")
    }
}
