//! HTTP route handler
//!
//! Axum handler for the audit webhook path.
//!
//! The handler is mounted with `any()` so it can answer wrong methods itself
//! with the same plain-text body as every other rejection.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::WebhookError;
use super::metrics::WebhookMetrics;
use crate::common::RawMessage;

/// Content type every webhook body must declare
const JSON_CONTENT_TYPE: &str = "application/json";

/// Shared state for handlers
pub struct HandlerState {
    /// Literal request path the webhook answers on
    pub path: String,
    pub messages: mpsc::Sender<RawMessage>,
    pub metrics: Arc<WebhookMetrics>,
    pub max_body_size: usize,
    pub cancel: CancellationToken,
}

/// POST <path> - Receive one audit webhook body
///
/// Accepted bodies are queued as a single raw message. When the queue is
/// full the handler waits for space (or for shutdown); it never drops.
pub async fn receive_audit(State(state): State<Arc<HandlerState>>, request: Request) -> Response {
    state.metrics.request_received();

    let (parts, body) = request.into_parts();
    let checked = if parts.uri.path() == state.path {
        read_body(&state, &parts.method, &parts.headers, body).await
    } else {
        Err(WebhookError::NotFound)
    };
    let bytes = match checked {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(method = %parts.method, path = parts.uri.path(), error = %e, "webhook request rejected");
            if e.is_client_error() {
                state.metrics.request_client_error();
            } else {
                state.metrics.request_server_error();
            }
            return e.into_response();
        }
    };

    let size = bytes.len() as u64;
    tokio::select! {
        sent = state.messages.send(bytes) => {
            if sent.is_err() {
                state.metrics.request_server_error();
                return WebhookError::ShuttingDown.into_response();
            }
        }
        _ = state.cancel.cancelled() => {
            state.metrics.request_server_error();
            return WebhookError::ShuttingDown.into_response();
        }
    }

    state.metrics.request_success(size);
    StatusCode::OK.into_response()
}

/// Validate method and content type, then read the size-capped body
async fn read_body(
    state: &HandlerState,
    method: &Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<Bytes, WebhookError> {
    if method != Method::POST {
        return Err(WebhookError::MethodNotAllowed(method.clone()));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.contains(JSON_CONTENT_TYPE) {
        return Err(WebhookError::WrongContentType);
    }

    axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| WebhookError::BadRequest(e.to_string()))
}
