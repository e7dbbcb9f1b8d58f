//! Blocking adapter
//!
//! For hosts that call into the source from plain threads: the adapter owns
//! a multi-threaded runtime so producers keep running between pulls.

use kaudit_protocol::EventBatch;
use tokio::runtime::Runtime;

use crate::error::{PipelineError, Result};
use crate::funnel::{PullStatus, SourceState};
use crate::metrics::PipelineMetrics;
use crate::source::{EventSource, SourceOptions};

/// Worker threads of the owned runtime
const RUNTIME_WORKERS: usize = 2;

/// Synchronous wrapper around `EventSource`
///
/// Must not be used from inside an async context.
pub struct BlockingEventSource {
    source: EventSource,
    runtime: Runtime,
}

impl BlockingEventSource {
    /// Open a source, blocking until it is ready
    pub fn open(params: &str, options: SourceOptions) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_WORKERS)
            .thread_name("kaudit-source")
            .enable_all()
            .build()
            .map_err(PipelineError::Runtime)?;

        let source = runtime.block_on(EventSource::open(params, options))?;
        Ok(Self { source, runtime })
    }

    /// Allocate a batch sized for this source
    pub fn new_batch(&self) -> Result<EventBatch> {
        self.source.new_batch()
    }

    /// Fill `batch`, blocking for at most the pull wait budget
    pub fn next_batch(&mut self, batch: &mut EventBatch) -> Result<PullStatus> {
        self.runtime.block_on(self.source.next_batch(batch))
    }

    /// Stop the producer; safe to call more than once
    pub fn close(&mut self) {
        self.runtime.block_on(self.source.close());
    }

    /// Current funnel state
    pub fn state(&self) -> SourceState {
        self.source.state()
    }

    /// Pipeline counters
    pub fn metrics(&self) -> &PipelineMetrics {
        self.source.metrics()
    }
}

impl std::fmt::Debug for BlockingEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingEventSource")
            .field("source", &self.source)
            .finish()
    }
}
