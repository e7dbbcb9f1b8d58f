//! Webhook source configuration
//!
//! Configuration options for the audit webhook listener.

use std::path::PathBuf;
use std::time::Duration;

use crate::common::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_QUEUE_SIZE, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SSL_CERTIFICATE,
};

/// Default bind address
const DEFAULT_ADDRESS: &str = "0.0.0.0:9765";

/// Default webhook path
const DEFAULT_PATH: &str = "/k8s-audit";

/// Webhook source configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// `host:port` to bind
    pub address: String,

    /// Path accepting POST requests
    pub path: String,

    /// Serve HTTPS instead of HTTP
    pub tls: bool,

    /// PEM file holding both certificate chain and private key
    pub ssl_certificate: PathBuf,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Message queue depth; a full queue makes handlers wait
    pub queue_size: usize,

    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.into(),
            path: DEFAULT_PATH.into(),
            tls: false,
            ssl_certificate: PathBuf::from(DEFAULT_SSL_CERTIFICATE),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Create config for an address and path
    pub fn new(address: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Get the URL this webhook serves
    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}{}", scheme, self.address, self.path)
    }
}
