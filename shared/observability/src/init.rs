//! Tracing initialization for connkit binaries.
//!
//! Provides subscriber setup with JSON or pretty formatting, always written
//! to stderr.

use std::env;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name for log attribution
    pub service_name: String,
    /// Log format: "json" or "pretty"
    pub format: String,
    /// Log level filter (e.g., "warn", "debug", "connkit_connectors=debug,info")
    pub level: String,
    /// Whether to include file/line in logs
    pub include_location: bool,
    /// Whether to include target (module path)
    pub include_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "connkit".to_string(),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            level: env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
            include_location: env::var("LOG_LOCATION").map(|v| v == "true").unwrap_or(false),
            include_target: false,
        }
    }
}

impl TracingConfig {
    /// Create config for a specific binary
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set format to JSON
    pub fn json(mut self) -> Self {
        self.format = "json".to_string();
        self
    }

    /// Set format to pretty (human-readable)
    pub fn pretty(mut self) -> Self {
        self.format = "pretty".to_string();
        self
    }

    pub fn with_location(mut self) -> Self {
        self.include_location = true;
        self
    }
}

#[derive(Error, Debug)]
pub enum TracingInitError {
    #[error("invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("tracing subscriber already installed")]
    AlreadyInstalled,
}

/// Initialize tracing with the given configuration
///
/// `RUST_LOG` wins over the configured level when both are set.
///
/// # Example
/// ```ignore
/// use connkit_observability::{init_tracing, TracingConfig};
///
/// init_tracing(TracingConfig::for_service("connkit").with_level("info"))?;
/// ```
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|_| TracingInitError::InvalidFilter(config.level.clone()))?;

    if config.format == "json" {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|_| TracingInitError::AlreadyInstalled)?;
    } else {
        let layer = fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|_| TracingInitError::AlreadyInstalled)?;
    }

    tracing::debug!(
        service = %config.service_name,
        format = %config.format,
        "Tracing initialized"
    );

    Ok(())
}
