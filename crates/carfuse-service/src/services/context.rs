//! Service context - dependency container for services
//!
//! Holds the audit repository, the query compiler and the audit settings.

use std::sync::Arc;

use carfuse_common::{AppConfig, AppError, AuditConfig};
use carfuse_core::traits::AuditLogRepository;
use carfuse_core::{LogQueryCompiler, SharedClock, SystemClock};
use carfuse_db::{Gateways, SqlAuditLogRepository, StoreTarget};
use tracing::info;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Audit data always lives in the secure store; [`ServiceContext::connect`]
/// binds the repository to that gateway.
#[derive(Clone)]
pub struct ServiceContext {
    gateways: Option<Gateways>,
    audit_repo: Arc<dyn AuditLogRepository>,
    compiler: LogQueryCompiler<SharedClock>,
    settings: AuditConfig,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        audit_repo: Arc<dyn AuditLogRepository>,
        settings: AuditConfig,
        clock: SharedClock,
    ) -> Self {
        let compiler = LogQueryCompiler::with_clock(clock).with_limits(settings.query_limits());
        Self {
            gateways: None,
            audit_repo,
            compiler,
            settings,
        }
    }

    /// Connect both stores and wire the audit repository to the secure one.
    ///
    /// Any connection failure is returned; there is no retry.
    pub async fn connect(config: &AppConfig) -> ServiceResult<Self> {
        let gateways = Gateways::connect(config)
            .await
            .map_err(|e| ServiceError::App(AppError::internal(e)))?;
        let repo = SqlAuditLogRepository::new(gateways.get(StoreTarget::Secure).clone());

        info!(
            app = %config.app.name,
            secure_store = gateways.get(StoreTarget::Secure).identity(),
            "Service context ready"
        );

        Ok(Self::new(
            Arc::new(repo),
            config.audit.clone(),
            Arc::new(SystemClock),
        )
        .with_gateways(gateways))
    }

    pub fn with_gateways(mut self, gateways: Gateways) -> Self {
        self.gateways = Some(gateways);
        self
    }

    /// Gateways, when the context was built from a live connection
    pub fn gateways(&self) -> Option<&Gateways> {
        self.gateways.as_ref()
    }

    /// Get the audit log repository
    pub fn audit_repo(&self) -> &dyn AuditLogRepository {
        self.audit_repo.as_ref()
    }

    pub fn compiler(&self) -> &LogQueryCompiler<SharedClock> {
        &self.compiler
    }

    pub fn settings(&self) -> &AuditConfig {
        &self.settings
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("gateways", &self.gateways)
            .field("audit_repo", &"...")
            .field("compiler", &self.compiler)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    gateways: Option<Gateways>,
    audit_repo: Option<Arc<dyn AuditLogRepository>>,
    settings: Option<AuditConfig>,
    clock: Option<SharedClock>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateways(mut self, gateways: Gateways) -> Self {
        self.gateways = Some(gateways);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn settings(mut self, settings: AuditConfig) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the ServiceContext
    ///
    /// Without an explicit repository, the secure gateway backs one.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if neither a repository nor gateways were given
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let audit_repo: Arc<dyn AuditLogRepository> = match (self.audit_repo, &self.gateways) {
            (Some(repo), _) => repo,
            (None, Some(gateways)) => Arc::new(SqlAuditLogRepository::new(
                gateways.get(StoreTarget::Secure).clone(),
            )),
            (None, None) => {
                return Err(ServiceError::validation(
                    "audit_repo or gateways is required",
                ))
            }
        };

        let ctx = ServiceContext::new(
            audit_repo,
            self.settings.unwrap_or_default(),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        );
        Ok(match self.gateways {
            Some(gateways) => ctx.with_gateways(gateways),
            None => ctx,
        })
    }
}
