//! Pipeline error types
//!
//! Errors visible to the consumer of an event source.

use thiserror::Error;

use kaudit_protocol::ProtocolError;
use kaudit_sources::SourceError;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Producer could not be opened or failed while running
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Batch could not be allocated
    #[error(transparent)]
    Batch(#[from] ProtocolError),

    /// Source options are unusable
    #[error("invalid source options: {0}")]
    InvalidOptions(String),

    /// Runtime for the blocking adapter could not be built
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl PipelineError {
    /// Check if the error ended a running source
    pub fn is_transport_fatal(&self) -> bool {
        matches!(self, Self::Source(e) if !e.is_open_error())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
