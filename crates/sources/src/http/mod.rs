//! Webhook Source - Kubernetes audit webhook receiver
//!
//! Serves a single path over HTTP or HTTPS and turns every accepted POST
//! body into one raw message.
//!
//! # Contract
//!
//! ```text
//! POST /k8s-audit
//! Content-Type: application/json
//!
//! {"kind":"EventList","items":[...]}
//! ```
//!
//! - `200 OK` (empty body) - queued
//! - `404` - any other path; the path is matched literally, braces included
//! - `405` - method other than POST
//! - `400` - wrong content type, body over the size limit, unreadable body
//!
//! # Lifecycle
//!
//! The listener binds on its own task, so bind and TLS failures arrive on
//! the error queue rather than from `spawn`. Cancelling the token starts a
//! graceful shutdown of both HTTP and HTTPS listeners: in-flight requests
//! get the configured grace period, then their connections are closed.
//!
//! # Example
//!
//! ```ignore
//! use kaudit_sources::http::{WebhookConfig, WebhookSource};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let source = WebhookSource::new(WebhookConfig::new("0.0.0.0:9765", "/k8s-audit"));
//! let producer = source.spawn(cancel.clone());
//! ```

mod config;
mod error;
mod handlers;
mod metrics;


use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use config::WebhookConfig;
pub use error::WebhookError;
pub use metrics::{WebhookMetrics, WebhookMetricsSnapshot};

use handlers::{HandlerState, receive_audit};

use crate::common::{ProducerHandle, ProducerTx, SourceMetricsProvider, producer_channels};
use crate::error::SourceError;

/// Audit webhook producer
pub struct WebhookSource {
    config: WebhookConfig,
    metrics: Arc<WebhookMetrics>,
}

impl WebhookSource {
    /// Create a new webhook source
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(WebhookMetrics::new()),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &WebhookMetrics {
        &self.metrics
    }

    /// Start the listener in a background task
    pub fn spawn(self, cancel: CancellationToken) -> ProducerHandle {
        let (tx, messages, errors) = producer_channels(self.config.queue_size);
        let metrics: Arc<dyn SourceMetricsProvider> = self.metrics.clone();
        let grace = self.config.shutdown_timeout;
        let task = tokio::spawn(self.run(tx, cancel));

        ProducerHandle::new(messages, errors, metrics).with_listener(ListenerHandle { task, grace })
    }

    /// Run the listener until cancelled or failed
    ///
    /// A failure is sent on the error queue; dropping the senders on return
    /// closes both queues.
    async fn run(self, tx: ProducerTx, cancel: CancellationToken) {
        let ProducerTx { messages, errors } = tx;

        let state = Arc::new(HandlerState {
            path: self.config.path.clone(),
            messages,
            metrics: Arc::clone(&self.metrics),
            max_body_size: self.config.max_body_size,
            cancel: cancel.clone(),
        });
        let app = build_router(state);

        match self.serve(app, cancel).await {
            Ok(()) => {
                tracing::info!(url = %self.config.url(), "webhook source stopped");
            }
            Err(e) => {
                tracing::error!(url = %self.config.url(), error = %e, "webhook source failed");
                let _ = errors.send(e).await;
            }
        }
    }

    /// Serve until cancelled
    ///
    /// Both schemes go through an `axum_server::Handle`, whose graceful
    /// shutdown drops every connection still open after the grace period.
    async fn serve(&self, app: Router, cancel: CancellationToken) -> Result<(), SourceError> {
        let listener = self.bind().await?;
        let listener = listener.into_std().map_err(|e| SourceError::Bind {
            address: self.config.address.clone(),
            source: e,
        })?;
        let tls = if self.config.tls {
            Some(self.load_certificate().await?)
        } else {
            None
        };

        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        let grace = self.config.shutdown_timeout;
        tokio::spawn(async move {
            cancel.cancelled().await;
            shutdown.graceful_shutdown(Some(grace));
        });

        tracing::info!(url = %self.config.url(), "webhook source listening");

        let served = match tls {
            Some(tls) => {
                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
            }
            None => {
                axum_server::from_tcp(listener)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
            }
        };
        served.map_err(|e| SourceError::Http(e.to_string()))
    }

    /// Load the PEM file holding both certificate chain and key
    async fn load_certificate(&self) -> Result<RustlsConfig, SourceError> {
        let cert = &self.config.ssl_certificate;
        RustlsConfig::from_pem_file(cert, cert)
            .await
            .map_err(|e| SourceError::Tls {
                path: cert.display().to_string(),
                source: e,
            })
    }

    async fn bind(&self) -> Result<TcpListener, SourceError> {
        TcpListener::bind(&self.config.address)
            .await
            .map_err(|e| SourceError::Bind {
                address: self.config.address.clone(),
                source: e,
            })
    }
}

/// Build the axum router
///
/// Every request lands in one handler that compares the path literally, so
/// a configured path is never read as a route pattern.
fn build_router(state: Arc<HandlerState>) -> Router {
    Router::new().fallback(receive_audit).with_state(state)
}

/// Extra wait past the grace period before the listener task is aborted
const SHUTDOWN_SLACK: Duration = Duration::from_secs(1);

/// Handle to a running listener task
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
    grace: Duration,
}

impl ListenerHandle {
    /// Wait for the listener to finish its graceful shutdown
    ///
    /// The caller cancels the token first. The listener closes connections
    /// still open after the grace period itself; the task is aborted only if
    /// it has not returned shortly after that.
    pub async fn shutdown(mut self) {
        match tokio::time::timeout(self.grace + SHUTDOWN_SLACK, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "webhook listener task failed");
            }
            Err(_) => {
                tracing::warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "webhook listener did not stop in time, aborting"
                );
                self.task.abort();
            }
        }
    }

    /// Check if the listener task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
