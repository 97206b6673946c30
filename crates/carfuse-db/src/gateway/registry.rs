//! One gateway per target store, built once at startup

use carfuse_common::{AppConfig, DatabaseConfig};
use tracing::info;

use super::executor::SafeExecutionGateway;
use crate::pool::{create_pool, database_identity, ConnectError, StoreTarget};

/// The application and secure gateways.
///
/// Built by [`Gateways::connect`] during startup and shared by reference
/// afterwards; there is no lazy or global initialisation.
#[derive(Debug, Clone)]
pub struct Gateways {
    application: SafeExecutionGateway,
    secure: SafeExecutionGateway,
}

impl Gateways {
    pub fn new(application: SafeExecutionGateway, secure: SafeExecutionGateway) -> Self {
        Self {
            application,
            secure,
        }
    }

    /// Connect both stores. Any failure is fatal for startup.
    pub async fn connect(config: &AppConfig) -> Result<Self, ConnectError> {
        let application = connect_target(StoreTarget::Application, &config.database).await?;
        let secure = connect_target(StoreTarget::Secure, &config.secure_database).await?;
        Ok(Self::new(application, secure))
    }

    /// The gateway for `target`; callers always name the store explicitly
    pub fn get(&self, target: StoreTarget) -> &SafeExecutionGateway {
        match target {
            StoreTarget::Application => &self.application,
            StoreTarget::Secure => &self.secure,
        }
    }
}

async fn connect_target(
    target: StoreTarget,
    config: &DatabaseConfig,
) -> Result<SafeExecutionGateway, ConnectError> {
    let identity = database_identity(&config.url);
    let pool = create_pool(config).await.map_err(|source| ConnectError {
        target,
        identity: identity.clone(),
        source,
    })?;
    info!(store = %target, database = %identity, "Database connection established");
    Ok(SafeExecutionGateway::new(target, pool, identity))
}
