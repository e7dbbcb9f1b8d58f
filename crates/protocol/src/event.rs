//! Normalized audit event

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One audit record extracted from a raw message
///
/// Produced by the normalizer and owned by whoever holds it; the pipeline
/// moves it from the normalizer into a batch slot exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Full JSON value of the audit record
    pub payload: Value,

    /// Parsed `stageTimestamp`
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event
    #[inline]
    pub fn new(payload: Value, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }

    /// Audit ID of the record, if present
    pub fn audit_id(&self) -> Option<&str> {
        self.payload.get("auditID").and_then(Value::as_str)
    }

    /// Serialize the payload to compact JSON bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}
