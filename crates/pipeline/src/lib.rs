//! Kaudit - Pipeline
//!
//! Turns the raw messages of one producer into pull-based event batches.
//!
//! # Architecture
//!
//! ```text
//! [Producer]                  [Merge task]                 [Funnel]
//!   messages ──┐                                          
//!              ├──→ normalize ──→ mpsc<Delivery> ──→ next_batch(&mut EventBatch)
//!   errors ────┘                                          ↑
//!                    cancel ─────────────────────────────┘
//! ```
//!
//! # Key Design
//!
//! - **Pipelined**: parsing runs on the merge task, independent of how fast
//!   the consumer pulls; the bounded delivery queue applies backpressure
//! - **One ordered queue**: events, the fatal error and end of stream travel
//!   the same queue as `Delivery` values, so their order is preserved
//! - **Per-pull wait budget**: every `next_batch` call waits at most
//!   `event_timeout` and reports `TimedOut` when the window passes
//!
//! # Example
//!
//! ```ignore
//! use kaudit_pipeline::{EventSource, PullStatus, SourceOptions};
//!
//! let mut source = EventSource::open("/var/log/audit.log", SourceOptions::default()).await?;
//! let mut batch = source.new_batch()?;
//! loop {
//!     match source.next_batch(&mut batch).await? {
//!         PullStatus::EndOfStream => break,
//!         _ => { for slot in &batch { /* ... */ } }
//!     }
//! }
//! source.close().await;
//! ```

mod blocking;
mod error;
mod funnel;
mod merge;
mod metrics;
mod source;

pub use blocking::BlockingEventSource;
pub use error::{PipelineError, Result};
pub use funnel::{Funnel, PullStatus, SourceState};
pub use merge::{Delivery, spawn_merge};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use source::{EventSource, SourceOptions};

#[cfg(test)]
mod merge_test;
