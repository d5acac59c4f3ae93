//! Identifier, timestamp and JSON map helpers shared by the builders and the queue.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Generate a fresh random identifier (UUID v4, 122 random bits).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time as an ISO-8601 string with millisecond precision, e.g.
/// `2025-01-31T12:00:00.123Z`.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drop `null` values and empty objects/arrays from the top level of a map.
pub fn compact(map: &mut Map<String, Value>) {
    map.retain(|_, value| match value {
        Value::Null => false,
        Value::Object(inner) => !inner.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    });
}

/// Overwrite `target` keys with the values from `source`.
pub fn merge_into(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Serialize a builder into a flat wire body. Keys from the open `extra` map fill in
/// around the typed fields; a typed field that is set always wins, so `extra` cannot
/// change `id`, `traceId`, `type` or any other field the builder owns. Absent or empty
/// values are dropped.
pub(crate) fn to_body<T: serde::Serialize>(
    value: &T,
    extra: &Map<String, Value>,
) -> serde_json::Result<Map<String, Value>> {
    let mut typed = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    compact(&mut typed);

    let mut body = extra.clone();
    merge_into(&mut body, typed);
    compact(&mut body);
    Ok(body)
}
