//! Flattens arbitrary JSON values returned by the extraction provider into
//! display strings.

use serde_json::Value;

/// Coerces any JSON value into a flat, trimmed display string.
///
/// - `null` becomes `""`, strings are trimmed, numbers and booleans are printed.
/// - Arrays and objects join the coercions of their elements (objects: their
///   values) with `", "`, dropping elements that coerce to `""`. An empty
///   container therefore becomes `""`, never `"[]"` or `"{}"`.
///
/// Total and idempotent on flat strings.
pub fn to_display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => join_non_empty(items.iter()),
        Value::Object(map) => join_non_empty(map.values()),
    }
}

/// Same as [`to_display_text`] for a field that may be absent.
pub fn optional_display_text(value: Option<&Value>) -> String {
    value.map(to_display_text).unwrap_or_default()
}

fn join_non_empty<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(to_display_text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
