//! Canonical JSON rendering for call deduplication.
//!
//! Pure function over a `serde_json::Value`: object keys are ordered
//! case-insensitively, internal whitespace in string leaves is collapsed, and
//! the result renders deterministically. The input is never mutated.

use serde_json::Value;
use std::cmp::Ordering;

/// Render a JSON value in canonical form.
///
/// Two logically-equivalent argument objects (same keys/values up to key
/// order and surface whitespace in strings) canonicalize to the same string.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            out.push_str(&value.to_string());
        }
        Value::String(s) => {
            let collapsed = collapse_whitespace(s);
            // serde_json handles escaping; a plain string always serializes.
            out.push_str(&Value::String(collapsed).to_string());
        }
        Value::Array(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(element, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| compare_keys(a, b));
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(child) = map.get(*key) {
                    write_value(child, out);
                }
            }
            out.push('}');
        }
    }
}

/// Case-insensitive ordering with a case-sensitive tiebreak so `"A"` and
/// `"a"` still order deterministically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match a.to_lowercase().cmp(&b.to_lowercase()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

/// Trim and collapse runs of whitespace to single spaces.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
