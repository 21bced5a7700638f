/// Rumfor Market Tracker — Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - Applications sorted by id (UTF-8 byte order)
///   - Fixed field order within each application
///   - Statuses as kebab-case strings
///   - UTF-8 JSON, no whitespace
///   - Event history is excluded — the hash covers the store, not the log

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::TrackerState;
use crate::events::SCHEMA_VERSION;

/// Canonical serialization of TrackerState to UTF-8 JSON bytes.
/// No whitespace. Deterministic field order.
/// Includes schema_version as the first field for identity binding.
pub fn canonical_serialize(state: &TrackerState) -> Vec<u8> {
    let obj = build_canonical_value(state);
    serde_json::to_string(&obj)
        .expect("canonical_serialize: JSON serialization failed")
        .into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &TrackerState) -> String {
    let bytes = canonical_serialize(state);
    let digest = Sha256::digest(&bytes);
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

/// Build the canonical serde_json::Value in strict field order.
///
/// Uses serde_json::Map which preserves insertion order.
/// Field order: schema_version, applications.
fn build_canonical_value(state: &TrackerState) -> Value {
    // -- applications (sorted by id; BTreeMap is already sorted) --
    let mut apps_list: Vec<Value> = Vec::new();
    for (_id, app) in &state.applications {
        let mut app_map = Map::new();
        app_map.insert("id".to_string(), Value::String(app.id.clone()));
        app_map.insert("vendor_id".to_string(), Value::String(app.vendor_id.clone()));
        app_map.insert("market_id".to_string(), Value::String(app.market_id.clone()));
        app_map.insert(
            "status".to_string(),
            Value::String(app.status.as_str().to_string()),
        );
        app_map.insert("notes".to_string(), Value::String(app.notes.clone()));
        app_map.insert(
            "review_notes".to_string(),
            Value::String(app.review_notes.clone()),
        );
        app_map.insert(
            "reviewed_by".to_string(),
            match &app.reviewed_by {
                Some(r) => Value::String(r.clone()),
                None => Value::Null,
            },
        );
        app_map.insert(
            "created_sequence".to_string(),
            Value::Number(app.created_sequence.into()),
        );
        app_map.insert(
            "updated_sequence".to_string(),
            Value::Number(app.updated_sequence.into()),
        );
        apps_list.push(Value::Object(app_map));
    }

    // -- top-level (strict field order) --
    // schema_version MUST be first — it is part of the store identity.
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number((SCHEMA_VERSION as u64).into()),
    );
    root.insert("applications".to_string(), Value::Array(apps_list));

    Value::Object(root)
}
