//! Pipeline metrics
//!
//! Atomic counters for normalization and delivery.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

use kaudit_protocol::ProtocolError;

/// Metrics for one event source pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Raw messages taken from the producer
    messages_received: AtomicU64,

    /// Events extracted by the normalizer
    events_normalized: AtomicU64,

    /// Messages that were not valid JSON
    parse_failures: AtomicU64,

    /// Values with no recognizable audit event shape
    unrecognized: AtomicU64,

    /// Events dropped for a missing or unparseable stageTimestamp
    timestamp_failures: AtomicU64,

    /// Events dropped for exceeding the per-event size limit
    oversized_dropped: AtomicU64,

    /// Events written into consumer batches
    events_delivered: AtomicU64,

    /// Pull calls that returned at least one event
    batches_delivered: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            events_normalized: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            unrecognized: AtomicU64::new(0),
            timestamp_failures: AtomicU64::new(0),
            oversized_dropped: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
        }
    }

    /// Record one raw message and the number of events it produced
    #[inline]
    pub fn record_message(&self, events: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.events_normalized.fetch_add(events, Ordering::Relaxed);
    }

    /// Record a normalization diagnostic
    pub fn record_protocol_error(&self, error: &ProtocolError) {
        let counter = match error {
            ProtocolError::InvalidJson(_) => &self.parse_failures,
            ProtocolError::NotRecognized => &self.unrecognized,
            ProtocolError::MissingTimestamp | ProtocolError::InvalidTimestamp { .. } => {
                &self.timestamp_failures
            }
            ProtocolError::EventTooLarge { .. } => &self.oversized_dropped,
            ProtocolError::BatchFull { .. } | ProtocolError::InvalidBatchSize { .. } => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed pull
    #[inline]
    pub fn record_batch(&self, events: u64) {
        if events > 0 {
            self.batches_delivered.fetch_add(1, Ordering::Relaxed);
            self.events_delivered.fetch_add(events, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_normalized: self.events_normalized.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            timestamp_failures: self.timestamp_failures.load(Ordering::Relaxed),
            oversized_dropped: self.oversized_dropped.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineMetricsSnapshot {
    pub messages_received: u64,
    pub events_normalized: u64,
    pub parse_failures: u64,
    pub unrecognized: u64,
    pub timestamp_failures: u64,
    pub oversized_dropped: u64,
    pub events_delivered: u64,
    pub batches_delivered: u64,
}

impl PipelineMetricsSnapshot {
    /// Total events and messages discarded before reaching a batch
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.parse_failures + self.unrecognized + self.timestamp_failures + self.oversized_dropped
    }
}
