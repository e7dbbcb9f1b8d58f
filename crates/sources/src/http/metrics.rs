//! Webhook source metrics
//!
//! Atomic counters for tracking webhook requests.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::{MetricsSnapshot, SourceMetrics, SourceMetricsProvider};

/// Webhook source metrics
#[derive(Debug, Default)]
pub struct WebhookMetrics {
    /// Base source metrics
    pub base: SourceMetrics,

    /// Total HTTP requests received
    pub requests_total: AtomicU64,

    /// Requests accepted and queued (200)
    pub requests_success: AtomicU64,

    /// Requests rejected as client errors (4xx)
    pub requests_client_error: AtomicU64,

    /// Requests refused during shutdown (5xx)
    pub requests_server_error: AtomicU64,
}

impl WebhookMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            base: SourceMetrics::new(),
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_client_error: AtomicU64::new(0),
            requests_server_error: AtomicU64::new(0),
        }
    }

    /// Record a request received
    #[inline]
    pub fn request_received(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted request and its body
    #[inline]
    pub fn request_success(&self, bytes: u64) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
        self.base.message_received(bytes);
    }

    /// Record a client error (4xx)
    #[inline]
    pub fn request_client_error(&self) {
        self.requests_client_error.fetch_add(1, Ordering::Relaxed);
        self.base.error();
    }

    /// Record a server error (5xx)
    #[inline]
    pub fn request_server_error(&self) {
        self.requests_server_error.fetch_add(1, Ordering::Relaxed);
        self.base.error();
    }

    /// Get extended snapshot
    pub fn extended_snapshot(&self) -> WebhookMetricsSnapshot {
        WebhookMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_client_error: self.requests_client_error.load(Ordering::Relaxed),
            requests_server_error: self.requests_server_error.load(Ordering::Relaxed),
            base: self.base.snapshot(),
        }
    }
}

impl SourceMetricsProvider for WebhookMetrics {
    fn source_type(&self) -> &'static str {
        "webhook"
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.base.snapshot()
    }
}

/// Extended metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookMetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_client_error: u64,
    pub requests_server_error: u64,
    pub base: MetricsSnapshot,
}
