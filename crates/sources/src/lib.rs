//! Kaudit - Sources
//!
//! Raw message producers that feed the audit pipeline. Each producer emits
//! opaque byte messages on a bounded queue and reports fatal errors on a
//! separate error queue; parsing happens downstream.
//!
//! # Available Sources
//!
//! - **File** - Reads a local file line by line until EOF (one message per line)
//! - **Webhook** - HTTP(S) listener accepting audit webhook POSTs (one message per body)
//!
//! # Open Parameters
//!
//! ```text
//! /var/log/kube-audit.log             -> file
//! http://0.0.0.0:9765/k8s-audit       -> webhook
//! https://0.0.0.0:9765/k8s-audit      -> webhook with TLS
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kaudit_sources::{open, ProducerOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let producer = open("http://0.0.0.0:9765/k8s-audit", &ProducerOptions::default(), cancel.clone()).await?;
//! let (mut messages, mut errors, listener) = producer.into_parts();
//! ```

pub mod file;
pub mod http;

mod common;
mod error;
mod params;

pub use common::{
    MetricsSnapshot, ProducerHandle, ProducerOptions, ProducerTx, RawMessage, SourceMetrics,
    SourceMetricsProvider, producer_channels,
};
pub use error::SourceError;
pub use file::{FileSource, FileSourceConfig};
pub use http::{ListenerHandle, WebhookConfig, WebhookMetricsSnapshot, WebhookSource};
pub use params::OpenParams;

use tokio_util::sync::CancellationToken;

/// Open a producer for the given parameter string
///
/// Caller-misuse errors (unsupported scheme, unreadable file) are returned
/// here. Webhook startup failures happen on the listener task and arrive on
/// the producer's error queue instead.
pub async fn open(
    params: &str,
    options: &ProducerOptions,
    cancel: CancellationToken,
) -> Result<ProducerHandle, SourceError> {
    match OpenParams::parse(params)? {
        OpenParams::File(path) => {
            let config = FileSourceConfig {
                path,
                queue_size: options.queue_size,
            };
            let source = FileSource::open(config).await?;
            Ok(source.spawn(cancel))
        }
        OpenParams::Webhook { address, path, tls } => {
            let config = WebhookConfig {
                address,
                path,
                tls,
                ssl_certificate: options.ssl_certificate.clone(),
                max_body_size: options.max_body_size,
                queue_size: options.queue_size,
                shutdown_timeout: options.shutdown_timeout,
            };
            Ok(WebhookSource::new(config).spawn(cancel))
        }
    }
}
