//! Kaudit Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use kaudit_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[source]\nbatch_size = 64").unwrap();
//! assert_eq!(config.source.batch_size, 64);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [source]
//! max_event_size = 262144
//! batch_size = 128
//! event_timeout = "30ms"
//!
//! [webhook]
//! max_batch_size = 12582912
//! queue_size = 50
//! ssl_certificate = "/etc/falco/falco.pem"
//! shutdown_timeout = "5s"
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod error;
mod logging;
mod source;
mod validation;
mod webhook;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogOutput};
pub use source::SourceConfig;
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batching and per-event limits
    pub source: SourceConfig,

    /// Webhook listener settings
    pub webhook: WebhookConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
