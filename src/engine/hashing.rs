//! Fingerprinting and content digests

use blake3::Hasher;
use serde_json::{Map, Value};

use crate::{Campaign, Fingerprint};

/// Serialize `value` as JSON with object keys sorted at every level.
///
/// Output does not depend on the map's iteration order, so it is stable across runs and across
/// `serde_json` feature sets.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_map(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars have a single serialization; to_string on Value cannot fail.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_map(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key.as_str()], out);
    }
    out.push('}');
}

/// Fingerprint of a campaign's listed metadata (all fields, canonical JSON).
pub fn fingerprint_of(campaign: &Campaign) -> Fingerprint {
    let mut out = String::new();
    write_canonical_map(&campaign.fields, &mut out);
    Fingerprint::from_stored(out)
}

/// blake3 hex digest, used to tag output records for the sink's own change detection.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Compare a fresh fingerprint with a cached one (absent cache never matches).
pub fn fingerprint_equals(current: &Fingerprint, cached: Option<&Fingerprint>) -> bool {
    match cached {
        Some(c) => c == current,
        None => false,
    }
}
