//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, PlexusConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &PlexusConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        validate_module_path(module)?;
    }

    Ok(())
}

/// Validates a filter key such as `plexus_core::queue`.
fn validate_module_path(module: &str) -> ConfigResult<()> {
    if module.is_empty() {
        return Err(ConfigError::validation("Log filter module cannot be empty"));
    }

    if module.split("::").any(str::is_empty) || module.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module: {module:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_validate_default_config() {
        let config = PlexusConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = PlexusConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("plexus.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_filter_keys_must_be_module_paths() {
        let mut config = PlexusConfig::default();
        config
            .logging
            .filters
            .insert("plexus_framework::channel".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config.logging.filters.insert("".into(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());

        config.logging.filters.clear();
        config.logging.filters.insert("plexus_core::".into(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
