//! Source error types
//!
//! Open-time errors are returned from `open`; the rest end a running
//! producer and travel its error queue.

use std::io;

/// Source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Open parameter names a scheme we do not serve
    #[error("scheme \"{0}\" is not supported")]
    UnsupportedScheme(String),

    /// Open parameter could not be interpreted
    #[error("invalid open parameter {params:?}: {reason}")]
    InvalidParams { params: String, reason: String },

    /// File could not be opened
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Read failure before reaching end of file
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// TLS certificate could not be loaded
    #[error("failed to load TLS certificate {path}: {source}")]
    Tls {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Listener stopped with an error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl SourceError {
    /// Create an invalid parameter error
    pub fn invalid_params(params: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            params: params.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is reported synchronously by `open`
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScheme(_) | Self::InvalidParams { .. } | Self::Open { .. }
        )
    }
}
