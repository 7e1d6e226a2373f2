//! Normalization of heterogeneous carrier tracking responses into a uniform
//! event model.
//!
//! Known response shapes are tried in a fixed order, first non-empty match
//! wins; a generic top-level scan backstops providers we have not seen. Field
//! extraction walks candidate key lists so each provider's spelling maps onto
//! the same three attributes. Normalization is lossless: the original record
//! always rides along in `raw`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single status update from a carrier's tracking API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub time: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    /// The raw provider record, preserved even when nothing else extracts.
    pub raw: Value,
}

impl TrackingEvent {
    /// Placeholder event used when a provider is unconfigured or unavailable.
    #[must_use]
    pub fn placeholder(status: &str) -> Self {
        Self {
            time: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            status: Some(status.to_string()),
            location: None,
            raw: Value::Null,
        }
    }
}

const TIME_FIELDS: [&str; 6] = [
    "time",
    "datetime",
    "timestamp",
    "date",
    "status_time",
    "event_time",
];
const STATUS_FIELDS: [&str; 5] = [
    "status",
    "description",
    "message",
    "status_description",
    "event",
];
const LOCATION_FIELDS: [&str; 4] = ["location", "place", "area", "branch"];

type ShapeExtractor = fn(&Value) -> Option<&Vec<Value>>;

fn flat_events(body: &Value) -> Option<&Vec<Value>> {
    body.get("events")?.as_array()
}

fn nested_tracking_events(body: &Value) -> Option<&Vec<Value>> {
    body.get("tracking")?.get("events")?.as_array()
}

fn data_history(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("history")?.as_array()
}

fn tracking_history(body: &Value) -> Option<&Vec<Value>> {
    body.get("tracking_history")?.as_array()
}

fn data_track(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("track")?.as_array()
}

/// Known provider layouts, tried in order.
const SHAPE_EXTRACTORS: [ShapeExtractor; 5] = [
    flat_events,
    nested_tracking_events,
    data_history,
    tracking_history,
    data_track,
];

/// Extract tracking events from an arbitrary provider response body.
///
/// Returns `Some(events)` for the first known shape that matches with at
/// least one event, `Some(vec![])` when a known shape matched but the
/// provider reported zero events, and `None` when no event-bearing structure
/// is recognized at all. Callers render the last two identically but may log
/// them differently.
#[must_use]
pub fn extract_events(body: &Value) -> Option<Vec<TrackingEvent>> {
    let mut matched_empty = false;

    for extractor in SHAPE_EXTRACTORS {
        match extractor(body) {
            Some(records) if !records.is_empty() => {
                return Some(records.iter().map(normalize_event).collect());
            }
            Some(_) => matched_empty = true,
            None => {}
        }
    }

    // Generic backstop: the first top-level property holding a non-empty
    // array of objects. Approximate by design; good enough for providers
    // whose layout we have not catalogued.
    if let Some(records) = first_object_array(body) {
        return Some(records.iter().map(normalize_event).collect());
    }

    if matched_empty {
        return Some(Vec::new());
    }
    None
}

fn first_object_array(body: &Value) -> Option<&Vec<Value>> {
    let object = body.as_object()?;
    object.values().find_map(|value| {
        let array = value.as_array()?;
        if !array.is_empty() && array[0].is_object() {
            Some(array)
        } else {
            None
        }
    })
}

fn normalize_event(record: &Value) -> TrackingEvent {
    TrackingEvent {
        time: first_scalar(record, &TIME_FIELDS),
        status: first_scalar(record, &STATUS_FIELDS),
        location: first_scalar(record, &LOCATION_FIELDS),
        raw: record.clone(),
    }
}

/// First candidate key whose value is a non-empty string or a number.
fn first_scalar(record: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
