//! Webhook request errors
//!
//! Rejections at the HTTP boundary. They never reach the normalizer and do
//! not affect the state of the source.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Reasons a webhook request is rejected
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Path other than the configured webhook path
    #[error("not found")]
    NotFound,

    /// Anything but POST
    #[error("{0} method not allowed")]
    MethodNotAllowed(Method),

    /// Content-Type does not mention application/json
    #[error("wrong Content Type")]
    WrongContentType,

    /// Body exceeded the size limit or could not be read
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Source is closing, message was not queued
    #[error("service unavailable: source is shutting down")]
    ShuttingDown,
}

impl WebhookError {
    /// HTTP status for this rejection
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::WrongContentType | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if the client is at fault
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}
