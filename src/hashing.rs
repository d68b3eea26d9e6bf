//! Hashing System - Canonical Text and Fingerprints
//!
//! Structured prop values render as canonical JSON, and a registry is
//! identified by a SHA-256 fingerprint over its component sources.

use sha2::{Digest, Sha256};
use serde::Serialize;
use serde_json::{to_string, Value};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

pub fn source_hash(source: &str) -> String {
    sha256_hex(source.as_bytes())
}

/// Fingerprint of a whole registry: sha256 over the canonical JSON of
/// `name -> source hash`. Insensitive to registration order.
pub fn registry_fingerprint<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<String, serde_json::Error> {
    let map: serde_json::Map<String, Value> = entries
        .into_iter()
        .map(|(name, hash)| (name.to_string(), Value::String(hash.to_string())))
        .collect();
    let canonical = canonical_json(&map)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

// We need hex encoding
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
