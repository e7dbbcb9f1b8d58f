//! Funnel - pull side of the pipeline
//!
//! Fills a caller-owned `EventBatch` from the merged delivery queue within a
//! per-call wait budget.
//!
//! # States
//!
//! ```text
//! Active ──(error, batch non-empty)──→ Draining ──(next pull)──→ Exhausted
//!   │                                                               ↑
//!   └──(error with empty batch, end of stream, cancellation)───────┘
//! ```
//!
//! A fatal error that arrives while a batch already holds events is kept
//! back: the events are returned first and the error on the following pull.

use std::sync::Arc;
use std::time::Duration;

use kaudit_protocol::EventBatch;
use kaudit_sources::SourceError;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::merge::Delivery;
use crate::metrics::PipelineMetrics;

/// Default pull wait budget
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_millis(30);

/// Outcome of a successful pull
///
/// The number of events is `batch.len()`; `TimedOut` and `EndOfStream` may
/// come with a partially filled batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    /// Batch returned without the wait budget running out
    Ok,

    /// Wait budget elapsed; more data may follow
    TimedOut,

    /// Source is exhausted; every later pull returns this too
    EndOfStream,
}

/// Lifecycle of the pull side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Pulls wait for data
    Active,

    /// A fatal error is waiting to be returned
    Draining,

    /// No more data will be returned
    Exhausted,
}

/// Pull-based batcher over the merged delivery queue
#[derive(Debug)]
pub struct Funnel {
    deliveries: mpsc::Receiver<Delivery>,
    cancel: CancellationToken,
    event_timeout: Duration,
    metrics: Arc<PipelineMetrics>,
    state: SourceState,
    pending_error: Option<SourceError>,
}

impl Funnel {
    /// Create a funnel over a delivery queue
    pub fn new(
        deliveries: mpsc::Receiver<Delivery>,
        cancel: CancellationToken,
        event_timeout: Duration,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            deliveries,
            cancel,
            event_timeout,
            metrics,
            state: SourceState::Active,
            pending_error: None,
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Fill `batch` with the next events
    ///
    /// The batch is cleared first. Returns once the batch is full, the wait
    /// budget elapses, or the source ends. A fatal producer error is
    /// returned as `Err` exactly once; the source is exhausted afterwards.
    pub async fn next_batch(&mut self, batch: &mut EventBatch) -> Result<PullStatus> {
        batch.clear();

        match self.state {
            SourceState::Exhausted => return Ok(PullStatus::EndOfStream),
            SourceState::Draining => {
                self.state = SourceState::Exhausted;
                return match self.pending_error.take() {
                    Some(e) => Err(PipelineError::Source(e)),
                    None => Ok(PullStatus::EndOfStream),
                };
            }
            SourceState::Active => {}
        }

        let status = self.fill(batch).await;
        self.metrics.record_batch(batch.len() as u64);
        status
    }

    async fn fill(&mut self, batch: &mut EventBatch) -> Result<PullStatus> {
        let deadline = tokio::time::sleep_until(Instant::now() + self.event_timeout);
        tokio::pin!(deadline);

        while !batch.is_full() {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    self.state = SourceState::Exhausted;
                    return Ok(PullStatus::EndOfStream);
                }

                _ = &mut deadline => {
                    return Ok(PullStatus::TimedOut);
                }

                delivery = self.deliveries.recv() => match delivery {
                    Some(Delivery::Event(event)) => {
                        if let Err(e) = batch.push(&event) {
                            self.metrics.record_protocol_error(&e);
                            tracing::warn!(
                                audit_id = event.audit_id().unwrap_or_default(),
                                error = %e,
                                "dropping audit event"
                            );
                        }
                    }
                    Some(Delivery::Error(e)) => {
                        if batch.is_empty() {
                            self.state = SourceState::Exhausted;
                            return Err(PipelineError::Source(e));
                        }
                        self.pending_error = Some(e);
                        self.state = SourceState::Draining;
                        return Ok(PullStatus::Ok);
                    }
                    Some(Delivery::Closed) | None => {
                        self.state = SourceState::Exhausted;
                        return Ok(PullStatus::EndOfStream);
                    }
                },
            }
        }

        Ok(PullStatus::Ok)
    }
}
