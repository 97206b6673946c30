//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use carfuse_core::QueryLimits;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    /// Application store
    pub database: DatabaseConfig,
    /// Isolated store for audit and compliance data
    pub secure_database: DatabaseConfig,
    pub audit: AuditConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" | "local" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Connection pool settings for one store
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Pool settings with defaults for everything but the URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Audit log query and export limits
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
    #[serde(default = "default_max_bulk_rows")]
    pub max_bulk_rows: u32,
    #[serde(default = "default_max_export_rows")]
    pub max_export_rows: u32,
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_export_expiry_hours")]
    pub export_expiry_hours: i64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            max_bulk_rows: default_max_bulk_rows(),
            max_export_rows: default_max_export_rows(),
            delete_batch_size: default_delete_batch_size(),
            export_dir: default_export_dir(),
            export_expiry_hours: default_export_expiry_hours(),
        }
    }
}

impl AuditConfig {
    /// Caps handed to the query compiler.
    ///
    /// The default page size never exceeds `max_per_page`.
    pub fn query_limits(&self) -> QueryLimits {
        let max_per_page = self.max_per_page.max(1);
        QueryLimits {
            default_per_page: self.default_per_page.clamp(1, max_per_page),
            max_per_page,
            max_bulk_rows: self.max_bulk_rows.max(1),
            max_export_rows: self.max_export_rows.max(1),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "carfuse".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}

fn default_max_bulk_rows() -> u32 {
    5000
}

fn default_max_export_rows() -> u32 {
    10000
}

fn default_delete_batch_size() -> usize {
    1000
}

fn default_export_dir() -> PathBuf {
    env::temp_dir().join("secure_exports")
}

fn default_export_expiry_hours() -> i64 {
    24
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let audit_defaults = AuditConfig::default();

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars
                    .get("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            database: vars.database("DB_")?,
            secure_database: vars.database("SECURE_DB_")?,
            audit: AuditConfig {
                default_per_page: vars
                    .positive("AUDIT_DEFAULT_PER_PAGE")?
                    .unwrap_or(audit_defaults.default_per_page),
                max_per_page: vars
                    .positive("AUDIT_MAX_PER_PAGE")?
                    .unwrap_or(audit_defaults.max_per_page),
                max_bulk_rows: vars
                    .positive("AUDIT_MAX_BULK_ROWS")?
                    .unwrap_or(audit_defaults.max_bulk_rows),
                max_export_rows: vars
                    .positive("AUDIT_MAX_EXPORT_ROWS")?
                    .unwrap_or(audit_defaults.max_export_rows),
                delete_batch_size: vars
                    .positive("AUDIT_DELETE_BATCH_SIZE")?
                    .unwrap_or(audit_defaults.delete_batch_size),
                export_dir: vars
                    .get("AUDIT_EXPORT_DIR")
                    .map_or(audit_defaults.export_dir, PathBuf::from),
                export_expiry_hours: vars
                    .parse("AUDIT_EXPORT_EXPIRY_HOURS")?
                    .unwrap_or(audit_defaults.export_expiry_hours),
            },
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key, raw))
            })
            .transpose()
    }

    /// Like `parse`, but zero is rejected
    fn positive<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr + Default + PartialEq,
    {
        match self.parse::<T>(key)? {
            Some(value) if value == T::default() => Err(ConfigError::InvalidValue(
                key,
                self.get(key).unwrap_or_default(),
            )),
            other => Ok(other),
        }
    }

    fn database(&self, prefix: &'static str) -> Result<DatabaseConfig, ConfigError> {
        let (url, max, min, timeout) = match prefix {
            "SECURE_DB_" => (
                "SECURE_DB_URL",
                "SECURE_DB_MAX_CONNECTIONS",
                "SECURE_DB_MIN_CONNECTIONS",
                "SECURE_DB_ACQUIRE_TIMEOUT_SECS",
            ),
            _ => (
                "DB_URL",
                "DB_MAX_CONNECTIONS",
                "DB_MIN_CONNECTIONS",
                "DB_ACQUIRE_TIMEOUT_SECS",
            ),
        };

        Ok(DatabaseConfig {
            url: self.get(url).ok_or(ConfigError::MissingVar(url))?,
            max_connections: self.parse(max)?.unwrap_or_else(default_max_connections),
            min_connections: self.parse(min)?.unwrap_or_else(default_min_connections),
            acquire_timeout_secs: self
                .parse(timeout)?
                .unwrap_or_else(default_acquire_timeout_secs),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
