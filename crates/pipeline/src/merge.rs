//! Merge task
//!
//! Waits on the producer's message and error queues plus cancellation,
//! normalizes every message and forwards the outcome as one ordered stream
//! of `Delivery` values.

use std::sync::Arc;

use kaudit_protocol::{AuditEvent, ProtocolError, normalize_message};
use kaudit_sources::{RawMessage, SourceError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::metrics::PipelineMetrics;

/// One item on the merged queue
#[derive(Debug)]
pub enum Delivery {
    /// A normalized event, in producer order
    Event(AuditEvent),

    /// Transport-fatal producer error; nothing follows it
    Error(SourceError),

    /// Producer finished normally; nothing follows it
    Closed,
}

/// Spawn the merge task
///
/// Returns the consumer side of the merged queue and the task handle. The
/// task ends after forwarding `Error` or `Closed`, or when cancelled.
pub fn spawn_merge(
    messages: mpsc::Receiver<RawMessage>,
    errors: mpsc::Receiver<SourceError>,
    queue_size: usize,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
) -> (mpsc::Receiver<Delivery>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_size.max(1));
    let merge = Merge {
        messages,
        errors,
        deliveries: tx,
        metrics,
        cancel,
    };
    (rx, tokio::spawn(merge.run()))
}

struct Merge {
    messages: mpsc::Receiver<RawMessage>,
    errors: mpsc::Receiver<SourceError>,
    deliveries: mpsc::Sender<Delivery>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
}

impl Merge {
    async fn run(mut self) {
        let mut messages_open = true;
        let mut errors_open = true;

        while messages_open || errors_open {
            // Messages win over errors so that everything a producer sent
            // before failing is delivered ahead of the failure.
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::debug!("merge task cancelled");
                    return;
                }

                message = self.messages.recv(), if messages_open => match message {
                    Some(raw) => {
                        if !self.forward_message(&raw).await {
                            return;
                        }
                    }
                    None => messages_open = false,
                },

                error = self.errors.recv(), if errors_open => match error {
                    Some(e) => {
                        tracing::error!(error = %e, "producer failed");
                        self.send(Delivery::Error(e)).await;
                        return;
                    }
                    None => errors_open = false,
                },
            }
        }

        tracing::debug!("producer finished");
        self.send(Delivery::Closed).await;
    }

    /// Normalize one message and forward its events
    ///
    /// Returns false once the consumer is gone or cancellation fired.
    async fn forward_message(&self, raw: &[u8]) -> bool {
        let (events, errors) = normalize_message(raw);
        self.metrics.record_message(events.len() as u64);

        for error in &errors {
            self.metrics.record_protocol_error(error);
            log_protocol_error(error, raw.len());
        }

        for event in events {
            if !self.send(Delivery::Event(event)).await {
                return false;
            }
        }
        true
    }

    /// Send one delivery, giving up on cancellation
    async fn send(&self, delivery: Delivery) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.deliveries.send(delivery) => sent.is_ok(),
        }
    }
}

fn log_protocol_error(error: &ProtocolError, message_size: usize) {
    match error {
        ProtocolError::NotRecognized => {
            tracing::debug!(message_size, "{error}, skipping");
        }
        _ => {
            tracing::warn!(message_size, error = %error, "discarding audit data");
        }
    }
}
