//! Runtime settings shared by every request.

use super::{ConfigError, HrrConfig};
use crate::{LoggerTemplate, ParamSource, SourceRegistry};

/// Read-only state injected into pipelines and response writers.
///
/// # Example
///
/// ```rust
/// use hrr::config::{HrrConfig, Settings};
///
/// let settings = Settings::builder()
///     .config(HrrConfig { log_all_requests: true, ..HrrConfig::default() })
///     .build();
///
/// assert!(settings.log_all_requests());
/// assert_eq!(settings.validation_tag(), "validate");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Settings {
    config: HrrConfig,
    logger: LoggerTemplate,
    sources: SourceRegistry,
}

impl Settings {
    /// Creates settings for `config` that log to the ambient subscriber.
    #[must_use]
    pub fn new(config: HrrConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates settings whose logger is built from `config.logging`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Telemetry` if the log level directive is invalid.
    pub fn from_config(config: HrrConfig) -> Result<Self, ConfigError> {
        let logger = LoggerTemplate::from_config(&config.logging)?;
        Ok(Self {
            config,
            logger,
            sources: SourceRegistry::default(),
        })
    }

    /// Returns a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HrrConfig {
        &self.config
    }

    /// Returns true if every request is logged.
    #[must_use]
    pub fn log_all_requests(&self) -> bool {
        self.config.log_all_requests
    }

    /// Returns the tag key applied by body validation.
    #[must_use]
    pub fn validation_tag(&self) -> &str {
        &self.config.validation_tag
    }

    /// Returns the logger template.
    #[must_use]
    pub fn logger(&self) -> &LoggerTemplate {
        &self.logger
    }

    /// Returns the parameter source registry.
    #[must_use]
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    inner: Settings,
}

impl SettingsBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: HrrConfig) -> Self {
        self.inner.config = config;
        self
    }

    /// Sets the logger template.
    pub fn logger(mut self, logger: LoggerTemplate) -> Self {
        self.inner.logger = logger;
        self
    }

    /// Replaces the source registry.
    pub fn sources(mut self, sources: SourceRegistry) -> Self {
        self.inner.sources = sources;
        self
    }

    /// Registers one more parameter source type.
    pub fn register_source<T: ParamSource>(mut self) -> Self {
        self.inner.sources.register::<T>();
        self
    }

    /// Builds the settings.
    #[must_use]
    pub fn build(self) -> Settings {
        self.inner
    }
}
