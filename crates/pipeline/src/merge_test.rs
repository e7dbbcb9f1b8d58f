//! Merge task tests

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kaudit_sources::{SourceError, producer_channels};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{Delivery, PipelineMetrics, spawn_merge};

const EVENT_A: &str = r#"{"kind":"Event","auditID":"a","stageTimestamp":"2023-01-01T00:00:00.000000000Z"}"#;
const LIST_BC: &str = r#"{"kind":"EventList","items":[{"auditID":"b","stageTimestamp":"2023-01-01T00:00:01Z"},{"auditID":"c","stageTimestamp":"2023-01-01T00:00:02Z"}]}"#;

async fn next(rx: &mut mpsc::Receiver<Delivery>) -> Option<Delivery> {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout waiting for delivery")
}

fn audit_id(delivery: Option<Delivery>) -> String {
    match delivery {
        Some(Delivery::Event(event)) => event.audit_id().unwrap().to_string(),
        other => panic!("expected event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_events_forwarded_in_order_then_closed() {
    let (tx, messages, errors) = producer_channels(10);
    let metrics = Arc::new(PipelineMetrics::new());
    let (mut rx, task) = spawn_merge(messages, errors, 10, metrics.clone(), CancellationToken::new());

    tx.messages.send(Bytes::from_static(EVENT_A.as_bytes())).await.unwrap();
    tx.messages.send(Bytes::from_static(LIST_BC.as_bytes())).await.unwrap();
    drop(tx);

    assert_eq!(audit_id(next(&mut rx).await), "a");
    assert_eq!(audit_id(next(&mut rx).await), "b");
    assert_eq!(audit_id(next(&mut rx).await), "c");
    assert!(matches!(next(&mut rx).await, Some(Delivery::Closed)));
    assert!(next(&mut rx).await.is_none());

    task.await.unwrap();
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.messages_received, 2);
    assert_eq!(snapshot.events_normalized, 3);
}

#[tokio::test]
async fn test_malformed_message_does_not_stop_merge() {
    let (tx, messages, errors) = producer_channels(10);
    let metrics = Arc::new(PipelineMetrics::new());
    let (mut rx, _task) = spawn_merge(messages, errors, 10, metrics.clone(), CancellationToken::new());

    tx.messages.send(Bytes::from_static(b"{\"kind\":\"Event\",")).await.unwrap();
    tx.messages.send(Bytes::from_static(b"{\"kind\":\"Status\"}")).await.unwrap();
    tx.messages.send(Bytes::from_static(EVENT_A.as_bytes())).await.unwrap();
    drop(tx);

    assert_eq!(audit_id(next(&mut rx).await), "a");
    assert!(matches!(next(&mut rx).await, Some(Delivery::Closed)));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.parse_failures, 1);
    assert_eq!(snapshot.unrecognized, 1);
}

#[tokio::test]
async fn test_messages_sent_before_error_come_first() {
    let (tx, messages, errors) = producer_channels(10);
    let (mut rx, task) = spawn_merge(
        messages,
        errors,
        10,
        Arc::new(PipelineMetrics::new()),
        CancellationToken::new(),
    );

    tx.messages.send(Bytes::from_static(EVENT_A.as_bytes())).await.unwrap();
    tx.errors.send(SourceError::Http("listener died".into())).await.unwrap();

    assert_eq!(audit_id(next(&mut rx).await), "a");
    assert!(matches!(next(&mut rx).await, Some(Delivery::Error(SourceError::Http(_)))));
    assert!(next(&mut rx).await.is_none());
    task.await.unwrap();
}

#[tokio::test]
async fn test_cancel_stops_merge() {
    let (_tx, messages, errors) = producer_channels(10);
    let cancel = CancellationToken::new();
    let (mut rx, task) = spawn_merge(
        messages,
        errors,
        10,
        Arc::new(PipelineMetrics::new()),
        cancel.clone(),
    );

    cancel.cancel();
    timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_cancel_releases_blocked_send() {
    let (tx, messages, errors) = producer_channels(10);
    let cancel = CancellationToken::new();
    let (_rx, task) = spawn_merge(
        messages,
        errors,
        1,
        Arc::new(PipelineMetrics::new()),
        cancel.clone(),
    );

    tx.messages.send(Bytes::from_static(LIST_BC.as_bytes())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}
