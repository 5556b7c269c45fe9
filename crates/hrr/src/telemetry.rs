//! Log subscriber installation.
//!
//! The request pipeline and the response writer emit plain `tracing` events.
//! This module builds the subscriber those events go to, as JSON lines for
//! production or pretty output for development.
//!
//! # Example
//!
//! ```rust,ignore
//! use hrr::telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Filter directive (e.g. `"info"` or `"hrr=debug,warn"`).
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include the target (module path).
    pub include_target: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_target: true,
            file_line_info: false,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
            file_line_info: true,
        }
    }
}

/// Builds a dispatcher for `config` without installing it.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the level directive is invalid.
pub fn build_dispatch(config: &LogConfig) -> Result<Dispatch, TelemetryError> {
    let filter = create_env_filter(&config.level)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    Ok(Dispatch::new(subscriber))
}

/// Builds a dispatcher for `config` and installs it as the global default.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the level directive is invalid
/// or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    let dispatch = build_dispatch(config)?;
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

/// Field names used by request and error log events.
pub mod fields {
    /// Peer address of the request.
    pub const REMOTE_ADDR: &str = "remote_addr";

    /// HTTP method.
    pub const METHOD: &str = "method";

    /// Request URL.
    pub const URL: &str = "url";

    /// Raw request body.
    pub const BODY: &str = "body";

    /// Correlation identifier shared with the error envelope.
    pub const CORRELATION_ID: &str = "id";
}
