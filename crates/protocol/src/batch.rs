//! EventBatch - Fixed-capacity batch of serialized audit events
//!
//! The `EventBatch` is what a consumer pulls from an event source. It is
//! allocated once when the source is opened and reused for every pull.
//!
//! # Memory Layout
//!
//! ```text
//! slots: [slot0][slot1][slot2]...[slotN-1]    (N = capacity, fixed)
//!         ^^^^^^^^^^^^^^^^^^^^
//!         filled: len
//! slot:  data: Vec<u8> (compact JSON), timestamp
//! ```
//!
//! Slot buffers keep their allocation between pulls, so a steady stream of
//! events stops allocating once every slot has seen a large enough event.

use chrono::{DateTime, Utc};

use crate::event::AuditEvent;
use crate::{ProtocolError, Result};

/// One output slot of a batch
#[derive(Debug, Clone, Default)]
pub struct EventSlot {
    /// Serialized event payload
    data: Vec<u8>,

    /// Event timestamp
    timestamp: DateTime<Utc>,
}

impl EventSlot {
    /// Get the serialized payload
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the payload as text
    ///
    /// Payloads are written by `serde_json`, so this only fails for slots
    /// that were never filled through `EventBatch::push`.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Get the event timestamp
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the event timestamp as nanoseconds since the Unix epoch
    ///
    /// Returns 0 for timestamps outside the representable i64 range.
    #[inline]
    pub fn timestamp_nanos(&self) -> u64 {
        self.timestamp
            .timestamp_nanos_opt()
            .and_then(|ns| u64::try_from(ns).ok())
            .unwrap_or(0)
    }
}

/// Fixed-capacity, pre-allocated batch of events
///
/// Filled in arrival order. A batch shorter than its capacity is a normal
/// outcome of a pull, not an error.
#[derive(Debug, Clone)]
pub struct EventBatch {
    /// Pre-allocated slots, `slots.len()` is the capacity
    slots: Vec<EventSlot>,

    /// Number of filled slots
    len: usize,

    /// Maximum serialized size of a single event
    max_event_size: usize,
}

impl EventBatch {
    /// Create a batch with `capacity` slots
    ///
    /// # Errors
    ///
    /// Returns `InvalidBatchSize` if either parameter is zero.
    pub fn new(capacity: usize, max_event_size: usize) -> Result<Self> {
        if capacity == 0 || max_event_size == 0 {
            return Err(ProtocolError::InvalidBatchSize {
                capacity,
                max_event_size,
            });
        }

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, EventSlot::default);

        Ok(Self {
            slots,
            len: 0,
            max_event_size,
        })
    }

    /// Get the number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get the number of filled slots
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no slot is filled
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if every slot is filled
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len >= self.slots.len()
    }

    /// Get the per-event size limit
    #[inline]
    pub fn max_event_size(&self) -> usize {
        self.max_event_size
    }

    /// Get a filled slot by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&EventSlot> {
        self.slots[..self.len].get(index)
    }

    /// Iterate over the filled slots in arrival order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &EventSlot> {
        self.slots[..self.len].iter()
    }

    /// Serialize an event into the next free slot
    ///
    /// An event whose serialized form exceeds the size limit does not
    /// consume a slot; the batch is left as it was.
    pub fn push(&mut self, event: &AuditEvent) -> Result<()> {
        let capacity = self.slots.len();
        let max = self.max_event_size;
        let Some(slot) = self.slots.get_mut(self.len) else {
            return Err(ProtocolError::BatchFull { capacity });
        };

        slot.data.clear();
        if let Err(e) = serde_json::to_writer(&mut slot.data, &event.payload) {
            slot.data.clear();
            return Err(e.into());
        }

        let size = slot.data.len();
        if size > max {
            slot.data.clear();
            slot.data.shrink_to(max);
            return Err(ProtocolError::event_too_large(size, max));
        }

        slot.timestamp = event.timestamp;
        self.len += 1;
        Ok(())
    }

    /// Mark every slot free again (keeps slot allocations)
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a EventSlot;
    type IntoIter = std::slice::Iter<'a, EventSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots[..self.len].iter()
    }
}
