//! Message normalization
//!
//! Turns one raw transport message (a file line or a webhook body) into zero
//! or more `AuditEvent`s by recursive shape dispatch:
//!
//! - JSON array: every element is dispatched on its own
//! - `kind: "EventList"`: every entry of `items` is decoded as an event
//! - `kind: "Event"`: the value itself is decoded as an event
//! - anything else: not recognized
//!
//! Problems are collected next to the events instead of aborting the
//! message. A bad entry only costs that entry; its siblings still count.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::event::AuditEvent;
use crate::ProtocolError;

/// `kind` of a single audit event
pub const EVENT_KIND: &str = "Event";

/// `kind` of an audit event list
pub const EVENT_LIST_KIND: &str = "EventList";

/// Field carrying the event timestamp
const TIMESTAMP_FIELD: &str = "stageTimestamp";

enum Shape {
    Array,
    Event,
    EventList,
    Unknown,
}

impl Shape {
    fn of(value: &Value) -> Self {
        if value.is_array() {
            return Self::Array;
        }
        match value.get("kind").and_then(Value::as_str) {
            Some(EVENT_KIND) => Self::Event,
            Some(EVENT_LIST_KIND) if value.get("items").is_some_and(Value::is_array) => {
                Self::EventList
            }
            _ => Self::Unknown,
        }
    }
}

/// Parse and normalize a raw message
///
/// Returns the extracted events in source order and every problem met on
/// the way. Malformed JSON yields no events and a single error.
pub fn normalize_message(data: &[u8]) -> (Vec<AuditEvent>, Vec<ProtocolError>) {
    match serde_json::from_slice::<Value>(data) {
        Ok(value) => normalize_value(value),
        Err(e) => (Vec::new(), vec![ProtocolError::InvalidJson(e)]),
    }
}

/// Normalize an already parsed JSON value
pub fn normalize_value(value: Value) -> (Vec<AuditEvent>, Vec<ProtocolError>) {
    let mut events = Vec::new();
    let mut errors = Vec::new();
    dispatch(value, &mut events, &mut errors);
    (events, errors)
}

fn dispatch(value: Value, events: &mut Vec<AuditEvent>, errors: &mut Vec<ProtocolError>) {
    match Shape::of(&value) {
        Shape::Array => {
            if let Value::Array(elements) = value {
                for element in elements {
                    dispatch(element, events, errors);
                }
            }
        }
        Shape::EventList => {
            if let Value::Object(mut list) = value
                && let Some(Value::Array(items)) = list.remove("items")
            {
                for item in items {
                    match decode_event(item) {
                        Ok(event) => events.push(event),
                        Err(e) => errors.push(e),
                    }
                }
            }
        }
        Shape::Event => match decode_event(value) {
            Ok(event) => events.push(event),
            Err(e) => errors.push(e),
        },
        Shape::Unknown => errors.push(ProtocolError::NotRecognized),
    }
}

/// Decode a single audit event, reading its stage timestamp
fn decode_event(value: Value) -> Result<AuditEvent, ProtocolError> {
    let timestamp = match value.get(TIMESTAMP_FIELD) {
        None => return Err(ProtocolError::MissingTimestamp),
        Some(Value::String(raw)) => parse_timestamp(raw)?,
        Some(other) => {
            return Err(ProtocolError::invalid_timestamp(
                other.to_string(),
                "not a string",
            ));
        }
    };
    Ok(AuditEvent::new(value, timestamp))
}

/// Parse an RFC 3339 timestamp with up to nanosecond precision
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProtocolError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ProtocolError::invalid_timestamp(raw, e))
}
