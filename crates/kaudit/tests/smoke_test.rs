//! Smoke tests for kaudit
//!
//! These tests run real producers end to end: a webhook listener on a local
//! port fed over plain HTTP/1.1, and the binary reading an audit log file.

use std::io::Write;
use std::process::Command;
use std::time::Duration;

use kaudit_pipeline::{EventSource, PullStatus, SourceOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};

const EVENT_LIST: &str = r#"{"kind":"EventList","apiVersion":"audit.k8s.io/v1","items":[{"kind":"Event","auditID":"e1","stage":"ResponseComplete","stageTimestamp":"2023-01-01T00:00:01.000000001Z"},{"kind":"Event","auditID":"e2","stage":"ResponseComplete","stageTimestamp":"2023-01-01T00:00:02.000000002Z"}]}"#;

const SINGLE_EVENT: &str = r#"{"kind":"Event","auditID":"e0","stageTimestamp":"2023-01-01T00:00:00.000000000Z"}"#;

/// Reserve a local port by binding and releasing it
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Connect, retrying while the listener starts up
async fn connect(port: u16) -> TcpStream {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => return stream,
            Err(_) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(e) => panic!("listener never came up: {e}"),
        }
    }
}

/// Send one HTTP/1.1 request and return the status code
async fn send(port: u16, method: &str, path: &str, content_type: &str, body: &str) -> u16 {
    let mut stream = connect(port).await;
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("malformed response: {response:?}"))
}

#[tokio::test]
async fn test_webhook_end_to_end() {
    let port = free_port();
    let params = format!("http://127.0.0.1:{port}/k8s-audit");
    let mut source = EventSource::open(&params, SourceOptions::default())
        .await
        .unwrap();

    assert_eq!(send(port, "GET", "/k8s-audit", "application/json", "").await, 405);
    assert_eq!(send(port, "POST", "/k8s-audit", "text/plain", SINGLE_EVENT).await, 400);
    assert_eq!(send(port, "POST", "/k8s-audit", "application/json", SINGLE_EVENT).await, 200);
    assert_eq!(send(port, "POST", "/k8s-audit", "application/json", EVENT_LIST).await, 200);

    let mut batch = source.new_batch().unwrap();
    let mut ids = Vec::new();
    let mut nanos = Vec::new();
    timeout(Duration::from_secs(5), async {
        while ids.len() < 3 {
            let status = source.next_batch(&mut batch).await.unwrap();
            assert_ne!(status, PullStatus::EndOfStream);
            for slot in &batch {
                let value: serde_json::Value = serde_json::from_slice(slot.data()).unwrap();
                ids.push(value["auditID"].as_str().unwrap().to_string());
                nanos.push(slot.timestamp_nanos());
            }
        }
    })
    .await
    .expect("events should arrive");

    assert_eq!(ids, vec!["e0", "e1", "e2"]);
    assert_eq!(nanos[1], 1_672_531_201_000_000_001);
    assert_eq!(nanos[2], 1_672_531_202_000_000_002);

    // Nothing more is pending: an empty pull times out instead of ending.
    assert_eq!(
        source.next_batch(&mut batch).await.unwrap(),
        PullStatus::TimedOut
    );
    assert!(batch.is_empty());

    timeout(Duration::from_secs(10), source.close()).await.unwrap();
    source.close().await;
    assert_eq!(
        source.next_batch(&mut batch).await.unwrap(),
        PullStatus::EndOfStream
    );
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}

#[test]
fn test_binary_prints_file_events() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{SINGLE_EVENT}").unwrap();
    writeln!(file, "not json").unwrap();
    writeln!(file, "{EVENT_LIST}").unwrap();
    file.flush().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_kaudit"))
        .arg(file.path())
        .arg("--log-level")
        .arg("error")
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("2023-01-01T00:00:00.000000000Z {"));
    assert!(lines[1].starts_with("2023-01-01T00:00:01.000000001Z {"));
    assert!(lines[2].contains("\"auditID\":\"e2\""));
}

#[test]
fn test_binary_rejects_unsupported_scheme() {
    let output = Command::new(env!("CARGO_BIN_EXE_kaudit"))
        .arg("kafka://broker:9092/audit")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("not supported"));
}
