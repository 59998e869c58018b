//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used for
//! drift detection between a declaration and its last applied state.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the checksum of a structured payload.
///
/// The payload is canonicalized first, so two payloads that only differ in
/// mapping key order hash to the same value.
pub fn compute_value_checksum(payload: &Value) -> String {
    let canonical = canonicalize(payload);
    // A `Value` always has string keys, serialization cannot fail.
    let serialized = serde_json::to_string(&canonical).unwrap_or_default();
    compute_content_checksum(&serialized)
}

/// Rebuild a value with every object's keys inserted in sorted order.
///
/// Array order is significant and kept as is.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
