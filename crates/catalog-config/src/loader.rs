//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use catalog_core::CatalogError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Environment variable selecting the environment overlay file.
pub const ENVIRONMENT_VAR: &str = "CATALOG_ENV";

/// Prefix of environment variable overrides (`CATALOG__SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "CATALOG";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{dir}/default.toml` - Default values
    /// 2. `{dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{dir}/local.toml` - Untracked local overrides
    /// 4. Environment variables with the `CATALOG__` prefix
    pub fn new(config_dir: impl Into<String>) -> Result<Self, CatalogError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CatalogError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// The previous configuration stays active if the new one is invalid.
    pub async fn reload(&self) -> Result<(), CatalogError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, CatalogError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{config_dir}/{name}.toml");
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_catalog_error)?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_catalog_error)?;

        if app_config.app.environment != environment {
            debug!(
                "Environment overlay '{}' overrides app.environment '{}'",
                environment, app_config.app.environment
            );
            app_config.app.environment = environment;
        }

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), CatalogError> {
        if config.app.environment == "production"
            && config
                .auth
                .accounts
                .iter()
                .any(|a| a.username == "admin" && a.password == "password")
        {
            warn!("Default admin credentials are enabled in production");
        }

        ConfigValidator::validate(config)
            .map_err(|errors| CatalogError::Configuration(format_validation_errors(&errors)))
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_catalog_error(err: ConfigError) -> CatalogError {
    CatalogError::Configuration(err.to_string())
}
