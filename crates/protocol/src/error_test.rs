//! Tests for protocol error types

use crate::error::ProtocolError;

#[test]
fn test_error_creation_invalid_timestamp() {
    let err = ProtocolError::invalid_timestamp("yesterday", "input contains invalid characters");
    assert!(matches!(
        err,
        ProtocolError::InvalidTimestamp { ref value, .. } if value == "yesterday"
    ));
}

#[test]
fn test_error_creation_event_too_large() {
    let err = ProtocolError::event_too_large(300, 200);
    assert!(matches!(
        err,
        ProtocolError::EventTooLarge {
            size: 300,
            max: 200
        }
    ));
}

#[test]
fn test_error_display_not_recognized() {
    assert_eq!(
        ProtocolError::NotRecognized.to_string(),
        "data not recognized as a k8s audit event"
    );
}

#[test]
fn test_error_display_missing_timestamp() {
    assert_eq!(
        ProtocolError::MissingTimestamp.to_string(),
        "can't read stageTimestamp"
    );
}

#[test]
fn test_error_display_event_too_large() {
    let err = ProtocolError::event_too_large(300, 200);
    assert_eq!(err.to_string(), "event size 300 exceeds maximum 200");
}

#[test]
fn test_error_from_serde_json() {
    let json_err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
    let err: ProtocolError = json_err.into();
    assert!(matches!(err, ProtocolError::InvalidJson(_)));
    assert!(err.to_string().starts_with("invalid JSON"));
}

#[test]
fn test_is_event_level() {
    assert!(ProtocolError::MissingTimestamp.is_event_level());
    assert!(ProtocolError::invalid_timestamp("x", "bad").is_event_level());
    assert!(ProtocolError::event_too_large(2, 1).is_event_level());
    assert!(!ProtocolError::NotRecognized.is_event_level());
    assert!(!ProtocolError::BatchFull { capacity: 1 }.is_event_level());
}
