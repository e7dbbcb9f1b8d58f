//! Configuration validation
//!
//! Rejects sizes that would make the source unusable.

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_source(config)?;
    validate_webhook(config)?;
    if config.log.level.trim().is_empty() {
        return Err(ConfigError::invalid_value("log", "level", "must not be empty"));
    }
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    let source = &config.source;
    if source.max_event_size == 0 {
        return Err(ConfigError::invalid_value("source", "max_event_size", "must be positive"));
    }
    if source.batch_size == 0 {
        return Err(ConfigError::invalid_value("source", "batch_size", "must be positive"));
    }
    if source.event_timeout.is_zero() {
        return Err(ConfigError::invalid_value("source", "event_timeout", "must be positive"));
    }
    Ok(())
}

fn validate_webhook(config: &Config) -> Result<()> {
    let webhook = &config.webhook;
    if webhook.max_batch_size == 0 {
        return Err(ConfigError::invalid_value("webhook", "max_batch_size", "must be positive"));
    }
    if webhook.queue_size == 0 {
        return Err(ConfigError::invalid_value("webhook", "queue_size", "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = Config::default();
        config.source.max_event_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.source.event_timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.webhook.max_batch_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.webhook.queue_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("webhook.queue_size"));
    }

    #[test]
    fn test_blank_log_level_rejected() {
        let mut config = Config::default();
        config.log.level = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("log.level"));
    }
}
