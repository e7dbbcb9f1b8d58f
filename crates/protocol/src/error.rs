//! Protocol error types
//!
//! Errors that can occur when normalizing messages or filling batches.
//! None of them are fatal for a source: callers log and move on.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Value has no recognizable audit event shape
    #[error("data not recognized as a k8s audit event")]
    NotRecognized,

    /// Audit event has no stageTimestamp field
    #[error("can't read stageTimestamp")]
    MissingTimestamp,

    /// stageTimestamp is present but not an RFC 3339 timestamp
    #[error("invalid stageTimestamp {value}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Serialized event exceeds the per-event size limit
    #[error("event size {size} exceeds maximum {max}")]
    EventTooLarge { size: usize, max: usize },

    /// Batch has no free slot left
    #[error("batch is full: contains {capacity} events")]
    BatchFull { capacity: usize },

    /// Batch sizing parameters are unusable
    #[error("invalid batch size: capacity {capacity}, max event size {max_event_size}")]
    InvalidBatchSize {
        capacity: usize,
        max_event_size: usize,
    },
}

impl ProtocolError {
    /// Create an invalid timestamp error
    #[inline]
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an event too large error
    #[inline]
    pub fn event_too_large(size: usize, max: usize) -> Self {
        Self::EventTooLarge { size, max }
    }

    /// Check if this error concerns a single event rather than a whole message
    pub fn is_event_level(&self) -> bool {
        matches!(
            self,
            Self::MissingTimestamp | Self::InvalidTimestamp { .. } | Self::EventTooLarge { .. }
        )
    }
}
