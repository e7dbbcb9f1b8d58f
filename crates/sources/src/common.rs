//! Common types and utilities for sources
//!
//! Shared functionality across all producers (file, webhook): the queue pair
//! a producer writes to, the handle the pipeline reads from, and metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::SourceError;
use crate::http::ListenerHandle;

/// One transport-level delivery (a file line or a webhook body)
pub type RawMessage = Bytes;

/// Default message queue depth
pub const DEFAULT_QUEUE_SIZE: usize = 50;

/// Default maximum webhook body size (12MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 12 * 1024 * 1024;

/// Default grace period for listener shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default certificate file for `https://` webhooks
pub const DEFAULT_SSL_CERTIFICATE: &str = "/etc/falco/falco.pem";

/// Producer settings that do not come from the open parameter
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    /// Message queue depth (backpressure bound)
    pub queue_size: usize,

    /// Maximum webhook request body size in bytes
    pub max_body_size: usize,

    /// PEM file holding both certificate chain and private key
    pub ssl_certificate: PathBuf,

    /// Grace period for in-flight webhook requests on close
    pub shutdown_timeout: Duration,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            ssl_certificate: PathBuf::from(DEFAULT_SSL_CERTIFICATE),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Producer side of the queue pair
#[derive(Debug)]
pub struct ProducerTx {
    /// Raw messages, bounded
    pub messages: mpsc::Sender<RawMessage>,

    /// Fatal producer errors
    pub errors: mpsc::Sender<SourceError>,
}

/// Create the queue pair for a producer
///
/// The error queue holds a single entry: a producer reports at most one
/// fatal error before it stops.
pub fn producer_channels(
    queue_size: usize,
) -> (ProducerTx, mpsc::Receiver<RawMessage>, mpsc::Receiver<SourceError>) {
    let (messages_tx, messages_rx) = mpsc::channel(queue_size.max(1));
    let (errors_tx, errors_rx) = mpsc::channel(1);
    (
        ProducerTx {
            messages: messages_tx,
            errors: errors_tx,
        },
        messages_rx,
        errors_rx,
    )
}

/// Consumer side of a running producer
pub struct ProducerHandle {
    messages: mpsc::Receiver<RawMessage>,
    errors: mpsc::Receiver<SourceError>,
    listener: Option<ListenerHandle>,
    metrics: Arc<dyn SourceMetricsProvider>,
}

impl ProducerHandle {
    /// Create a handle for a producer with no listener to shut down
    pub fn new(
        messages: mpsc::Receiver<RawMessage>,
        errors: mpsc::Receiver<SourceError>,
        metrics: Arc<dyn SourceMetricsProvider>,
    ) -> Self {
        Self {
            messages,
            errors,
            listener: None,
            metrics,
        }
    }

    /// Attach the listener task of a network producer
    pub fn with_listener(mut self, listener: ListenerHandle) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Get the metrics of the producer
    pub fn metrics(&self) -> Arc<dyn SourceMetricsProvider> {
        Arc::clone(&self.metrics)
    }

    /// Split into message queue, error queue and optional listener
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<RawMessage>,
        mpsc::Receiver<SourceError>,
        Option<ListenerHandle>,
    ) {
        (self.messages, self.errors, self.listener)
    }
}

impl std::fmt::Debug for ProducerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("source_type", &self.metrics.source_type())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Access to a producer's counters
pub trait SourceMetricsProvider: Send + Sync {
    /// Producer kind ("file", "webhook")
    fn source_type(&self) -> &'static str;

    /// Point-in-time counters
    fn snapshot(&self) -> MetricsSnapshot;
}

/// Metrics shared by all producer types
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Total messages emitted
    pub messages_received: AtomicU64,

    /// Total bytes emitted
    pub bytes_received: AtomicU64,

    /// Total errors encountered
    pub errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Record emitted message
    #[inline]
    pub fn message_received(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub bytes_received: u64,
    pub errors: u64,
}
