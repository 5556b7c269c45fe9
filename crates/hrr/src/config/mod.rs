//! Configuration and runtime settings.
//!
//! [`HrrConfig`] is plain data, loaded in layers by [`ConfigLoader`]:
//!
//! 1. built-in defaults
//! 2. a TOML or JSON file (or string)
//! 3. `PREFIX__KEY` environment overrides
//!
//! [`Settings`] is what request pipelines and response writers actually
//! receive. It is built once at startup from a config, a
//! [`LoggerTemplate`](crate::LoggerTemplate) and a
//! [`SourceRegistry`](crate::SourceRegistry), and shared read-only afterwards.
//!
//! ## Example TOML
//!
//! ```toml
//! log_all_requests = true
//! validation_tag = "binding"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

mod error;
mod loader;
mod settings;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{Settings, SettingsBuilder};

use crate::telemetry::{self, LogConfig};
use serde::Deserialize;

/// Default tag key whose rules the body validator applies.
pub const DEFAULT_VALIDATION_TAG: &str = "validate";

/// Library configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HrrConfig {
    /// Log every request, not only those whose pipeline opts in.
    pub log_all_requests: bool,

    /// Tag key selecting which declared field rules are applied.
    pub validation_tag: String,

    /// Log subscriber configuration.
    pub logging: LogConfig,
}

impl Default for HrrConfig {
    fn default() -> Self {
        Self {
            log_all_requests: false,
            validation_tag: DEFAULT_VALIDATION_TAG.to_string(),
            logging: LogConfig::default(),
        }
    }
}

impl HrrConfig {
    /// Development preset: every request logged, pretty output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            log_all_requests: true,
            validation_tag: DEFAULT_VALIDATION_TAG.to_string(),
            logging: LogConfig::development(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the validation tag is empty or
    /// the log level directive does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation_tag.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "validation_tag",
                "must not be empty",
            ));
        }

        if let Err(e) = telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HrrConfig::default();

        assert!(!config.log_all_requests);
        assert_eq!(config.validation_tag, "validate");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = HrrConfig::development();

        assert!(config.log_all_requests);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_tag_rejected() {
        let config = HrrConfig {
            validation_tag: "  ".to_string(),
            ..HrrConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("validation_tag"));
    }

    #[test]
    fn test_bad_level_rejected() {
        let mut config = HrrConfig::default();
        config.logging.level = "hrr=loudest".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<HrrConfig, _> = toml::from_str("log_everything = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: HrrConfig = toml::from_str("log_all_requests = true").unwrap();

        assert!(config.log_all_requests);
        assert_eq!(config.validation_tag, "validate");
        assert_eq!(config.logging, LogConfig::default());
    }
}
