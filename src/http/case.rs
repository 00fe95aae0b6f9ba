//! Deep key normalization for response payloads.
//!
//! Every mapping key, including those of maps nested inside arrays, is
//! converted to camelCase. Leaf values are never touched. The conversion is
//! idempotent: already camelCased keys come out unchanged.

use serde_json::{Map, Value};

/// Recursively camelCase every object key in `value`.
pub fn camel_case_deep(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, nested)| (to_camel_case(&key), camel_case_deep(nested)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camel_case_deep).collect()),
        leaf => leaf,
    }
}

/// `wait_for_ingest` → `waitForIngest`, `Account-ID` → `accountID`.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let words = key
        .split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|word| !word.is_empty());

    for (i, word) in words.enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
