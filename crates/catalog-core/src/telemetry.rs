//! Tracing setup and the injected logging context.
//!
//! The subscriber is built once by the server binary from [`TelemetryConfig`].
//! Long-lived components never log through ambient state of their own: each
//! one is handed a [`Logger`] at construction and instruments its work with
//! the span it carries.

use serde::{Deserialize, Serialize};
use tracing::Span;

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every component span.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_service_name() -> String {
    "catalog".to_string()
}

fn default_log_level() -> String {
    "info,catalog=debug,tower_http=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Installs the process subscriber.
///
/// Returns an error if a subscriber is already installed.
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &TelemetryConfig) -> crate::CatalogResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    result.map_err(|e| crate::CatalogError::Configuration(format!("Failed to install tracing subscriber: {e}")))
}

/// Logging context handed to a component.
///
/// Cloning is cheap; clones share the same parent span.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
}

impl Logger {
    /// Creates a logger for a named component.
    #[must_use]
    pub fn new(service: &str, component: &'static str) -> Self {
        Self {
            span: tracing::info_span!("component", service = %service, component),
        }
    }

    /// Creates a logger that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self { span: Span::none() }
    }

    /// Returns the component span.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Returns a child span for one operation of the component.
    #[must_use]
    pub fn operation(&self, name: &'static str) -> Span {
        tracing::debug_span!(parent: &self.span, "operation", name)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}
