//! Webhook section
//!
//! Settings for `http://` and `https://` open parameters. The bind address
//! and path come from the open parameter itself.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Webhook configuration
///
/// # Example
///
/// ```toml
/// [webhook]
/// max_batch_size = 12582912
/// queue_size = 50
/// ssl_certificate = "/etc/falco/falco.pem"
/// shutdown_timeout = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookConfig {
    /// Maximum request body size in bytes
    /// Default: 12582912 (12MB)
    pub max_batch_size: usize,

    /// Depth of the queue between listener and parser
    /// Default: 50
    pub queue_size: usize,

    /// PEM file with certificate chain and private key, for https
    /// Default: /etc/falco/falco.pem
    pub ssl_certificate: PathBuf,

    /// Grace period for in-flight requests on close
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 12 * 1024 * 1024,
            queue_size: 50,
            ssl_certificate: PathBuf::from("/etc/falco/falco.pem"),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
