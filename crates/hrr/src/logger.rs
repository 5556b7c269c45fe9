//! Per-request loggers.
//!
//! A [`LoggerTemplate`] is the process-wide log sink, fixed at startup. Each
//! request forks it into a [`RequestLogger`] whose output is discarded until
//! logging is enabled for that request. Nothing is shared between requests,
//! so enabling one request's output never affects another.

use crate::telemetry::{self, LogConfig, TelemetryError};
use std::fmt;
use tracing::Dispatch;

/// Process-wide log sink that per-request loggers are forked from.
#[derive(Clone, Default)]
pub struct LoggerTemplate {
    dispatch: Option<Dispatch>,
}

impl LoggerTemplate {
    /// Uses whatever dispatcher is the default when a logger is forked.
    ///
    /// This is the global subscriber installed by
    /// [`init_logging`](crate::telemetry::init_logging), if any.
    #[must_use]
    pub fn ambient() -> Self {
        Self::default()
    }

    /// Uses `dispatch` for every forked logger.
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Builds a dedicated dispatcher from `config`.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::LoggingInit` if the level directive is invalid.
    pub fn from_config(config: &LogConfig) -> Result<Self, TelemetryError> {
        telemetry::build_dispatch(config).map(Self::new)
    }

    fn sink(&self) -> Dispatch {
        self.dispatch
            .clone()
            .unwrap_or_else(|| tracing::dispatcher::get_default(Dispatch::clone))
    }

    /// Forks a logger; its output is discarded unless `enabled`.
    #[must_use]
    pub fn fork(&self, enabled: bool) -> RequestLogger {
        let sink = self.sink();
        let output = if enabled { sink.clone() } else { Dispatch::none() };
        RequestLogger {
            sink,
            output,
            enabled,
        }
    }

    /// Forks a logger that always writes to the sink.
    #[must_use]
    pub fn shared(&self) -> RequestLogger {
        self.fork(true)
    }
}

impl fmt::Debug for LoggerTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerTemplate")
            .field("explicit", &self.dispatch.is_some())
            .finish()
    }
}

/// Logger owned by a single request or response.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Dispatch,
    output: Dispatch,
    enabled: bool,
}

impl RequestLogger {
    /// Redirects output to the template's sink.
    pub fn enable(&mut self) {
        self.output = self.sink.clone();
        self.enabled = true;
    }

    /// Returns true if output reaches the sink.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs `f` with this logger as the current dispatcher.
    ///
    /// Every `tracing` event emitted inside `f` goes to this logger's output.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.output, f)
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("enabled", &self.enabled)
            .finish()
    }
}
