use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_RECEIPT_NUMBER_PREFIX: &str = "REC";
const CONFIG_DIR: &str = "config";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading error: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "database_url must not be empty"))]
    pub database_url: String,

    /// Deployment environment: "development", "test" or "production"
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level filter passed to the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix used when formatting sequential receipt numbers
    #[serde(default = "default_receipt_number_prefix")]
    #[validate(length(min = 1, max = 8, message = "receipt_number_prefix must be 1-8 chars"))]
    pub receipt_number_prefix: String,

    /// When set, accepting an in-progress receipt performs the approval
    /// hop itself before processing, as two audited transitions.
    #[serde(default)]
    pub auto_approve_on_accept: bool,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_receipt_number_prefix() -> String {
    DEFAULT_RECEIPT_NUMBER_PREFIX.to_string()
}

impl AppConfig {
    /// Builds a configuration directly from values, used by tests and embedders.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            environment: default_environment(),
            log_level: default_log_level(),
            receipt_number_prefix: default_receipt_number_prefix(),
            auto_approve_on_accept: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads configuration from `config/default.toml`, an environment-specific
/// overlay (`config/{APP_ENV}.toml`), and `APP_*` environment variables,
/// in ascending precedence.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("receipt_number_prefix", DEFAULT_RECEIPT_NUMBER_PREFIX)?
        .set_default("auto_approve_on_accept", false)?;

    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    if default_path.exists() {
        builder = builder.add_source(File::from(default_path));
    }

    let env_path = Path::new(CONFIG_DIR).join(format!("{}.toml", env));
    if env_path.exists() {
        builder = builder.add_source(File::from(env_path));
    }

    let settings = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;

    info!(environment = %app_config.environment, "configuration loaded");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let cfg = AppConfig::new("sqlite::memory:");
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.receipt_number_prefix, "REC");
        assert!(!cfg.auto_approve_on_accept);
        assert!(!cfg.is_production());
    }

    #[test]
    fn validation_rejects_empty_database_url() {
        let cfg = AppConfig::new("");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_oversized_prefix() {
        let mut cfg = AppConfig::new("sqlite::memory:");
        cfg.receipt_number_prefix = "WAYTOOLONGPREFIX".into();
        assert!(cfg.validate().is_err());
    }
}
