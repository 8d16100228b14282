//! Configuration validation.
//!
//! Every section is checked and all problems are reported together, so a
//! misconfigured deployment fails at startup with the full list.

use crate::{AppConfig, QueueBackend};
use catalog_core::TelemetryConfig;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { name: String, value: u64, maximum: u64 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Duration value must be positive.
    NonPositiveDuration { name: String },
    /// Reconnect backoff bounds are inverted.
    InvalidBackoff { initial_ms: u64, max_ms: u64 },
    /// A required name is empty.
    EmptyValue { name: String },
    /// No Basic authentication account is configured.
    NoAccounts,
    /// Two accounts share a username.
    DuplicateUsername { username: String },
    /// Log level directive is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge {
                name,
                value,
                maximum,
            } => {
                write!(
                    f,
                    "Pool size for {} is {} and exceeds the maximum allowed ({})",
                    name, value, maximum
                )
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::NonPositiveDuration { name } => {
                write!(f, "'{}' must be positive", name)
            }
            Self::InvalidBackoff { initial_ms, max_ms } => {
                write!(
                    f,
                    "Reconnect backoff initial delay ({}ms) exceeds the maximum ({}ms)",
                    initial_ms, max_ms
                )
            }
            Self::EmptyValue { name } => write!(f, "'{}' cannot be empty", name),
            Self::NoAccounts => write!(f, "At least one auth account must be configured"),
            Self::DuplicateUsername { username } => {
                write!(f, "Auth username '{}' is configured more than once", username)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error, off)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    fn require_positive(&mut self, name: &str, value: u64) {
        if value == 0 {
            self.add_error(ConfigValidationError::NonPositiveDuration {
                name: name.to_string(),
            });
        }
    }

    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u64 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "error", "off"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        Self::validate_database(&config.database, &mut result);
        Self::validate_redis(&config.redis, &mut result);
        Self::validate_queue(&config.queue, &mut result);
        Self::validate_processor(&config.processor, &mut result);
        Self::validate_auth(&config.auth, &mut result);
        Self::validate_storage(&config.storage, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_server(config: &crate::ServerConfig, result: &mut ValidationResult) {
        // 0 is invalid for binding
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        result.require_positive("server.request_timeout_secs", config.request_timeout_secs);
    }

    fn validate_database(config: &crate::DatabaseConfig, result: &mut ValidationResult) {
        if config.url.is_empty() {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("postgres://")
            && !config.url.starts_with("postgresql://")
        {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if u64::from(config.max_connections) > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                name: "database".to_string(),
                value: u64::from(config.max_connections),
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        result.require_positive("database.connect_timeout_secs", config.connect_timeout_secs);
        result.require_positive("database.idle_timeout_secs", config.idle_timeout_secs);
    }

    fn validate_redis(config: &crate::RedisConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }

        if config.pool_size as u64 > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                name: "redis".to_string(),
                value: config.pool_size as u64,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        result.require_positive("redis.product_ttl_secs", config.product_ttl_secs);
    }

    fn validate_queue(config: &crate::QueueConfig, result: &mut ValidationResult) {
        if config.queue_name.trim().is_empty() {
            result.add_error(ConfigValidationError::EmptyValue {
                name: "queue.queue_name".to_string(),
            });
        }

        if config.backend != QueueBackend::Rabbitmq {
            return;
        }

        match Url::parse(&config.url) {
            Ok(url) if matches!(url.scheme(), "amqp" | "amqps") => {}
            Ok(url) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "queue".to_string(),
                message: format!("unsupported scheme '{}', expected amqp or amqps", url.scheme()),
            }),
            Err(e) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "queue".to_string(),
                message: e.to_string(),
            }),
        }

        if config.prefetch == 0 {
            result.add_error(ConfigValidationError::EmptyValue {
                name: "queue.prefetch".to_string(),
            });
        }

        result.require_positive("queue.connect_timeout_secs", config.connect_timeout_secs);
    }

    fn validate_processor(config: &crate::ProcessorConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        result.require_positive("processor.drain_timeout_secs", config.drain_timeout_secs);
        result.require_positive("processor.backoff_initial_ms", config.backoff_initial_ms);

        let max_ms = config.backoff_max_secs.saturating_mul(1000);
        if config.backoff_initial_ms > max_ms {
            result.add_error(ConfigValidationError::InvalidBackoff {
                initial_ms: config.backoff_initial_ms,
                max_ms,
            });
        }
    }

    fn validate_auth(config: &crate::AuthConfig, result: &mut ValidationResult) {
        if config.accounts.is_empty() {
            result.add_error(ConfigValidationError::NoAccounts);
            return;
        }

        let mut seen = HashSet::new();
        for account in &config.accounts {
            if account.username.is_empty() {
                result.add_error(ConfigValidationError::EmptyValue {
                    name: "auth.accounts.username".to_string(),
                });
            } else if !seen.insert(account.username.as_str()) {
                result.add_error(ConfigValidationError::DuplicateUsername {
                    username: account.username.clone(),
                });
            }
        }
    }

    fn validate_storage(config: &crate::StorageConfig, result: &mut ValidationResult) {
        if config.bucket.trim().is_empty() {
            result.add_error(ConfigValidationError::EmptyValue {
                name: "storage.bucket".to_string(),
            });
        }
    }

    fn validate_observability(config: &TelemetryConfig, result: &mut ValidationResult) {
        // Accepts "info" as well as directive lists like "info,catalog=debug".
        let valid = !config.log_level.trim().is_empty()
            && config.log_level.split(',').all(|directive| {
                let level = directive.rsplit('=').next().unwrap_or_default();
                Self::VALID_LOG_LEVELS.contains(&level.trim().to_lowercase().as_str())
            });

        if !valid {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BasicAccount;

    #[test]
    fn test_valid_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidPort { .. })));
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut config = AppConfig::default();
        config.database.min_connections = 50;
        config.database.max_connections = 10;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigValidationError::InvalidPoolSize { min: 50, max: 10 }));
    }

    #[test]
    fn test_non_postgres_database_url() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://localhost/catalog".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidUrl { url_type, .. } if url_type == "database")));
    }

    #[test]
    fn test_redis_disabled_skips_checks() {
        let mut config = AppConfig::default();
        config.redis.enabled = false;
        config.redis.url = "not-a-url".to_string();
        config.redis.product_ttl_secs = 0;

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_product_ttl() {
        let mut config = AppConfig::default();
        config.redis.product_ttl_secs = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::NonPositiveDuration {
                name: "redis.product_ttl_secs".to_string()
            }]
        );
    }

    #[test]
    fn test_queue_url_scheme() {
        let mut config = AppConfig::default();
        config.queue.url = "http://localhost:5672".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidUrl { url_type, .. } if url_type == "queue")));
    }

    #[test]
    fn test_zero_queue_connect_timeout() {
        let mut config = AppConfig::default();
        config.queue.connect_timeout_secs = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::NonPositiveDuration {
                name: "queue.connect_timeout_secs".to_string()
            }]
        );
    }

    #[test]
    fn test_memory_queue_ignores_url() {
        let mut config = AppConfig::default();
        config.queue.backend = QueueBackend::Memory;
        config.queue.url = String::new();

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_inverted_backoff() {
        let mut config = AppConfig::default();
        config.processor.backoff_initial_ms = 5_000;
        config.processor.backoff_max_secs = 1;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigValidationError::InvalidBackoff {
            initial_ms: 5_000,
            max_ms: 1_000
        }));
    }

    #[test]
    fn test_duplicate_usernames() {
        let mut config = AppConfig::default();
        config.auth.accounts.push(BasicAccount {
            username: "admin".to_string(),
            password: "other".to_string(),
            user_id: 2,
        });

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::DuplicateUsername {
                username: "admin".to_string()
            }]
        );
    }

    #[test]
    fn test_no_accounts() {
        let mut config = AppConfig::default();
        config.auth.accounts.clear();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors, vec![ConfigValidationError::NoAccounts]);
    }

    #[test]
    fn test_log_level_directives() {
        let mut config = AppConfig::default();
        config.observability.log_level = "warn,catalog_jobs=trace".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.observability.log_level = "verbose".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidLogLevel { .. })));
    }

    #[test]
    fn test_multiple_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.storage.bucket = String::new();
        config.queue.queue_name = " ".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_validation_errors() {
        let errors = vec![
            ConfigValidationError::NoAccounts,
            ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: 0,
            },
        ];

        let formatted = format_validation_errors(&errors);
        assert!(formatted.contains("Configuration validation failed"));
        assert!(formatted.contains("1. At least one auth account"));
        assert!(formatted.contains("2. Invalid port for server.port"));
    }
}
