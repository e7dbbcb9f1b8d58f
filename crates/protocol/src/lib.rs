//! Kaudit Protocol - Core types for the audit event pipeline
//!
//! This crate provides the foundational types that flow through the pipeline:
//! - `AuditEvent` - One normalized audit record with its stage timestamp
//! - `EventBatch` - Pre-allocated, fixed-capacity batch handed to consumers
//! - `normalize_message` - Shape unwrapping of raw JSON messages into events
//!
//! # Accepted Shapes
//!
//! ```text
//! {"kind":"Event", "stageTimestamp":"2023-01-01T00:00:00.000000000Z", ...}
//! {"kind":"EventList", "items":[{...}, {...}]}
//! [ <either of the above>, [ ...nested arrays... ] ]
//! ```
//!
//! # Design Principles
//!
//! - **Owned values**: sub-values are moved out of the parsed tree, never cloned
//! - **Reusable slots**: batch slot buffers keep their allocation across pulls
//! - **Non-fatal diagnostics**: normalization reports problems next to the
//!   events it could extract instead of failing the whole message

mod batch;
mod error;
mod event;
mod normalize;

pub use batch::{EventBatch, EventSlot};
pub use error::ProtocolError;
pub use event::AuditEvent;
pub use normalize::{EVENT_KIND, EVENT_LIST_KIND, normalize_message, normalize_value};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Default number of slots in a batch
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Default maximum serialized size of one event (256KB)
pub const DEFAULT_MAX_EVENT_SIZE: usize = 256 * 1024;

#[cfg(test)]
mod error_test;
