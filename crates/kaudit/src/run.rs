//! Pull loop
//!
//! Opens the source, prints batches until end of stream, Ctrl-C or the
//! event limit, then closes the source.

use std::io::{self, Write};

use anyhow::{Context, Result};
use kaudit_config::Config;
use kaudit_pipeline::{EventSource, PullStatus, SourceOptions};
use kaudit_sources::ProducerOptions;

use crate::output::write_batch;

/// Build source options from the configuration
pub fn source_options(config: &Config) -> SourceOptions {
    SourceOptions {
        batch_size: config.source.batch_size,
        max_event_size: config.source.max_event_size,
        event_timeout: config.source.event_timeout,
        producer: ProducerOptions {
            queue_size: config.webhook.queue_size,
            max_body_size: config.webhook.max_batch_size,
            ssl_certificate: config.webhook.ssl_certificate.clone(),
            shutdown_timeout: config.webhook.shutdown_timeout,
        },
    }
}

/// Run the pull loop
pub async fn run(params: &str, options: SourceOptions, max_events: Option<u64>) -> Result<()> {
    let mut source = EventSource::open(params, options).await?;

    let result = pull_loop(&mut source, &mut io::stdout(), interrupted(), max_events).await;

    source.close().await;

    let producer = source.producer_metrics().snapshot();
    let pipeline = source.metrics().snapshot();
    tracing::info!(
        source_type = source.producer_metrics().source_type(),
        messages_received = producer.messages_received,
        bytes_received = producer.bytes_received,
        producer_errors = producer.errors,
        events_normalized = pipeline.events_normalized,
        events_delivered = pipeline.events_delivered,
        parse_failures = pipeline.parse_failures,
        unrecognized = pipeline.unrecognized,
        timestamp_failures = pipeline.timestamp_failures,
        oversized_dropped = pipeline.oversized_dropped,
        "final metrics"
    );

    result.map(|_| ())
}

/// Resolve on Ctrl-C; never resolve if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Pull batches and print them until end of stream, `shutdown` or the limit
///
/// Events already placed in the batch when `shutdown` fires are printed
/// before returning. Returns the number of events printed.
pub async fn pull_loop<W, F>(
    source: &mut EventSource,
    out: &mut W,
    shutdown: F,
    max_events: Option<u64>,
) -> Result<u64>
where
    W: Write,
    F: Future<Output = ()>,
{
    let mut batch = source.new_batch()?;
    let mut printed: u64 = 0;
    tokio::pin!(shutdown);

    loop {
        let pulled = tokio::select! {
            _ = &mut shutdown => None,
            status = source.next_batch(&mut batch) => Some(status),
        };

        let Some(status) = pulled else {
            tracing::info!(pending = batch.len(), "interrupted, shutting down");
            printed += write_batch(out, &batch).context("failed to write events")?;
            return Ok(printed);
        };

        let status = status.context("audit source failed")?;
        printed += write_batch(out, &batch).context("failed to write events")?;

        if status == PullStatus::EndOfStream {
            return Ok(printed);
        }
        if max_events.is_some_and(|max| printed >= max) {
            tracing::info!(printed, "event limit reached");
            return Ok(printed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;

    const EVENT: &str = r#"{"kind":"Event","auditID":"held-1","stageTimestamp":"2024-03-01T10:00:00.000000001Z"}"#;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    async fn post_event(port: u16, body: &str) -> String {
        let mut stream = None;
        for _ in 0..100 {
            if let Ok(s) = TcpStream::connect(("127.0.0.1", port)).await {
                stream = Some(s);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let mut stream = stream.expect("listener never came up");
        let request = format!(
            "POST /audit HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_interrupt_prints_partial_batch() {
        let port = free_port();
        let options = SourceOptions {
            event_timeout: Duration::from_secs(10),
            ..SourceOptions::default()
        };
        let mut source = EventSource::open(&format!("http://127.0.0.1:{port}/audit"), options)
            .await
            .unwrap();

        let response = post_event(port, EVENT).await;
        assert!(response.starts_with("HTTP/1.1 200"), "got {response:?}");

        let mut out = Vec::new();
        let printed = pull_loop(
            &mut source,
            &mut out,
            tokio::time::sleep(Duration::from_millis(300)),
            None,
        )
        .await
        .unwrap();
        source.close().await;

        let out = String::from_utf8(out).unwrap();
        assert_eq!(printed, 1);
        assert!(out.starts_with("2024-03-01T10:00:00.000000001Z "), "got {out:?}");
        assert!(out.contains(r#""auditID":"held-1""#));
    }

    #[tokio::test]
    async fn test_event_limit_stops_loop() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for _ in 0..5 {
            std::io::Write::write_all(&mut file, format!("{EVENT}\n").as_bytes()).unwrap();
        }
        let options = SourceOptions {
            batch_size: 2,
            ..SourceOptions::default()
        };
        let mut source = EventSource::open(file.path().to_str().unwrap(), options)
            .await
            .unwrap();

        let mut out = Vec::new();
        let printed = pull_loop(&mut source, &mut out, std::future::pending(), Some(3))
            .await
            .unwrap();
        source.close().await;

        // Stops after the batch that reaches the limit, before the last event
        assert!((3..=4).contains(&printed), "printed {printed}");
        assert_eq!(String::from_utf8(out).unwrap().lines().count() as u64, printed);
    }

    #[test]
    fn test_source_options_from_config() {
        let config = Config::from_str(
            r#"
[source]
batch_size = 7
event_timeout = "50ms"

[webhook]
max_batch_size = 2048
ssl_certificate = "/tmp/k.pem"
"#,
        )
        .unwrap();

        let options = source_options(&config);
        assert_eq!(options.batch_size, 7);
        assert_eq!(options.max_event_size, 256 * 1024);
        assert_eq!(options.event_timeout, Duration::from_millis(50));
        assert_eq!(options.producer.max_body_size, 2048);
        assert_eq!(options.producer.queue_size, 50);
        assert_eq!(options.producer.ssl_certificate, PathBuf::from("/tmp/k.pem"));
    }
}
