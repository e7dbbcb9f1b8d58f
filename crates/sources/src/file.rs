//! File Source - Local audit log files
//!
//! Reads a file of JSON documents, one per line (JSON Lines), and emits each
//! non-empty line as one raw message. Reaching end of file closes both
//! queues; a read failure before that is reported on the error queue first.
//!
//! Cancellation is observed between lines only. An in-flight read finishes,
//! and the task stops once the pipeline drops its end of the queue.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::common::{
    DEFAULT_QUEUE_SIZE, MetricsSnapshot, ProducerHandle, ProducerTx, SourceMetrics,
    SourceMetricsProvider, producer_channels,
};
use crate::error::SourceError;

/// Read buffer size (64KB)
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// File source configuration
#[derive(Debug, Clone)]
pub struct FileSourceConfig {
    /// File to read
    pub path: PathBuf,

    /// Message queue depth
    pub queue_size: usize,
}

impl FileSourceConfig {
    /// Create config for a path with the default queue depth
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

/// Line-oriented file producer
pub struct FileSource {
    config: FileSourceConfig,
    file: File,
    metrics: Arc<FileMetrics>,
}

impl FileSource {
    /// Open the file for reading
    ///
    /// Fails with `SourceError::Open` when the path does not exist or is
    /// not readable.
    pub async fn open(config: FileSourceConfig) -> Result<Self, SourceError> {
        let file = File::open(&config.path)
            .await
            .map_err(|e| SourceError::Open {
                path: config.path.display().to_string(),
                source: e,
            })?;

        Ok(Self {
            config,
            file,
            metrics: Arc::new(FileMetrics::default()),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SourceMetrics {
        &self.metrics.base
    }

    /// Start scanning in a background task
    pub fn spawn(self, cancel: CancellationToken) -> ProducerHandle {
        let (tx, messages, errors) = producer_channels(self.config.queue_size);
        let metrics: Arc<dyn SourceMetricsProvider> = self.metrics.clone();
        tokio::spawn(self.run(tx, cancel));
        ProducerHandle::new(messages, errors, metrics)
    }

    /// Scan the file until EOF, error, or cancellation
    async fn run(self, tx: ProducerTx, cancel: CancellationToken) {
        let path = self.config.path.display().to_string();
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, self.file);
        let mut line = Vec::new();

        tracing::debug!(path = %path, "file source started");

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(path = %path, "file source cancelled");
                return;
            }

            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    trim_line_ending(&mut line);
                    if line.is_empty() {
                        continue;
                    }

                    let message = Bytes::from(std::mem::take(&mut line));
                    self.metrics.base.message_received(message.len() as u64);

                    if tx.messages.send(message).await.is_err() {
                        // Pipeline went away
                        return;
                    }
                }
                Err(e) => {
                    self.metrics.base.error();
                    tracing::error!(path = %path, error = %e, "file read failed");
                    let _ = tx.errors.send(SourceError::Read { path, source: e }).await;
                    return;
                }
            }
        }

        tracing::debug!(
            path = %path,
            lines = self.metrics.base.snapshot().messages_received,
            "file source reached EOF"
        );
    }
}

/// Strip a trailing `\n` or `\r\n`
fn trim_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

/// File source metrics
#[derive(Debug, Default)]
struct FileMetrics {
    base: SourceMetrics,
}

impl SourceMetricsProvider for FileMetrics {
    fn source_type(&self) -> &'static str {
        "file"
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.base.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::trim_line_ending;

    #[test]
    fn test_trim_line_ending() {
        for (input, expected) in [
            (&b"abc\n"[..], &b"abc"[..]),
            (b"abc\r\n", b"abc"),
            (b"abc", b"abc"),
            (b"\n", b""),
            (b"abc\r", b"abc\r"),
        ] {
            let mut line = input.to_vec();
            trim_line_ending(&mut line);
            assert_eq!(line, expected);
        }
    }
}
