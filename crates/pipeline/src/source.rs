//! Event source lifecycle
//!
//! `EventSource` ties one producer, its merge task and the funnel to a
//! single cancellation token.

use std::sync::Arc;
use std::time::Duration;

use kaudit_protocol::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_EVENT_SIZE, EventBatch};
use kaudit_sources::{ListenerHandle, ProducerOptions, SourceMetricsProvider};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::funnel::{DEFAULT_EVENT_TIMEOUT, Funnel, PullStatus, SourceState};
use crate::merge::spawn_merge;
use crate::metrics::PipelineMetrics;

/// Settings for opening an event source
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Events per batch
    pub batch_size: usize,

    /// Maximum serialized size of one event in bytes
    pub max_event_size: usize,

    /// Wait budget of a single pull
    pub event_timeout: Duration,

    /// Producer settings
    pub producer: ProducerOptions,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
            producer: ProducerOptions::default(),
        }
    }
}

impl SourceOptions {
    /// Check that every size is usable
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidOptions("batch_size must be positive".into()));
        }
        if self.max_event_size == 0 {
            return Err(PipelineError::InvalidOptions(
                "max_event_size must be positive".into(),
            ));
        }
        if self.producer.queue_size == 0 {
            return Err(PipelineError::InvalidOptions("queue_size must be positive".into()));
        }
        if self.producer.max_body_size == 0 {
            return Err(PipelineError::InvalidOptions(
                "max_body_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// An open audit event source
///
/// Dropping the source fires cancellation; call `close` to also wait for
/// the webhook listener's graceful shutdown.
pub struct EventSource {
    funnel: Funnel,
    cancel: CancellationToken,
    listener: Option<ListenerHandle>,
    merge: Option<JoinHandle<()>>,
    producer_metrics: Arc<dyn SourceMetricsProvider>,
    metrics: Arc<PipelineMetrics>,
    options: SourceOptions,
    closed: bool,
}

impl EventSource {
    /// Open a source for a file path or `http(s)://host:port/path`
    ///
    /// Unsupported schemes and unreadable files fail here; webhook startup
    /// failures are returned by the first pull instead.
    pub async fn open(params: &str, options: SourceOptions) -> Result<Self> {
        options.validate()?;

        let cancel = CancellationToken::new();
        let producer = kaudit_sources::open(params, &options.producer, cancel.clone()).await?;
        let producer_metrics = producer.metrics();
        let (messages, errors, listener) = producer.into_parts();

        let metrics = Arc::new(PipelineMetrics::new());
        let (deliveries, merge) = spawn_merge(
            messages,
            errors,
            options.batch_size,
            Arc::clone(&metrics),
            cancel.clone(),
        );
        let funnel = Funnel::new(
            deliveries,
            cancel.clone(),
            options.event_timeout,
            Arc::clone(&metrics),
        );

        tracing::info!(
            params,
            source_type = producer_metrics.source_type(),
            batch_size = options.batch_size,
            max_event_size = options.max_event_size,
            "audit source opened"
        );

        Ok(Self {
            funnel,
            cancel,
            listener,
            merge: Some(merge),
            producer_metrics,
            metrics,
            options,
            closed: false,
        })
    }

    /// Allocate a batch sized for this source
    pub fn new_batch(&self) -> Result<EventBatch> {
        Ok(EventBatch::new(
            self.options.batch_size,
            self.options.max_event_size,
        )?)
    }

    /// Fill `batch` with the next events
    ///
    /// See [`Funnel::next_batch`].
    pub async fn next_batch(&mut self, batch: &mut EventBatch) -> Result<PullStatus> {
        self.funnel.next_batch(batch).await
    }

    /// Stop the producer and release its resources
    ///
    /// Safe to call more than once; only the first call has an effect. A
    /// webhook listener gets its grace period to finish in-flight requests.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();

        if let Some(listener) = self.listener.take() {
            listener.shutdown().await;
        }
        if let Some(merge) = self.merge.take() {
            let _ = merge.await;
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            events_delivered = snapshot.events_delivered,
            batches_delivered = snapshot.batches_delivered,
            discarded = snapshot.discarded(),
            "audit source closed"
        );
    }

    /// Current funnel state
    #[inline]
    pub fn state(&self) -> SourceState {
        self.funnel.state()
    }

    /// Check if `close` has been called
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pipeline counters
    #[inline]
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Producer counters
    pub fn producer_metrics(&self) -> Arc<dyn SourceMetricsProvider> {
        Arc::clone(&self.producer_metrics)
    }

    /// Options the source was opened with
    #[inline]
    pub fn options(&self) -> &SourceOptions {
        &self.options
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("source_type", &self.producer_metrics.source_type())
            .field("state", &self.funnel.state())
            .field("closed", &self.closed)
            .finish()
    }
}
