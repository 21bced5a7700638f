//! Snapshot layer — deterministic state snapshots.
//!
//! A snapshot file carries the serde JSON of the state plus the kernel's
//! canonical hash for verification. No timestamps in snapshot content
//! (determinism). Restore is strict: unknown fields, bad hashes, and
//! invariant violations all fail.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use rumfor_application_engine::domain::TrackerState;
use rumfor_application_engine::events::SCHEMA_VERSION;
use rumfor_application_engine::hashing::canonical_hash;
use rumfor_application_engine::invariants::validate_invariants;

use crate::error::RuntimeError;

/// Snapshot on-disk format.
#[derive(Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence number at which this snapshot was taken.
    pub sequence: u64,
    /// Schema version at snapshot time.
    pub schema_version: u32,
    /// Canonical hash of the state (SHA-256, lowercase hex).
    pub hash: String,
    /// serde JSON of the full state.
    pub state_json: String,
}

fn snapshot_filename(sequence: u64) -> String {
    format!("snapshot_{:06}.json", sequence)
}

/// Save a deterministic snapshot of the current state.
pub fn save_snapshot(
    dir: &Path,
    sequence: u64,
    state: &TrackerState,
) -> Result<PathBuf, RuntimeError> {
    fs::create_dir_all(dir)?;

    let state_json = serde_json::to_string(state)
        .map_err(|e| RuntimeError::SnapshotEncode(e.to_string()))?;
    let snap = Snapshot {
        sequence,
        schema_version: SCHEMA_VERSION,
        hash: canonical_hash(state),
        state_json,
    };

    let path = dir.join(snapshot_filename(sequence));
    let content = serde_json::to_string(&snap)
        .map_err(|e| RuntimeError::SnapshotEncode(e.to_string()))?;

    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    info!(sequence, path = %path.display(), "snapshot saved");
    Ok(path)
}

/// Load a snapshot at a specific sequence number.
/// Returns None if no snapshot exists at that sequence.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, RuntimeError> {
    let path = dir.join(snapshot_filename(sequence));
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap: Snapshot = serde_json::from_str(&content)
        .map_err(|e| RuntimeError::SnapshotDecode(e.to_string()))?;
    Ok(Some(snap))
}

/// Load the latest snapshot in a directory.
/// Scans for snapshot_NNNNNN.json files and returns the highest sequence.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, RuntimeError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best_seq: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if let Some(seq_str) = name_str
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
        {
            if let Ok(seq) = seq_str.parse::<u64>() {
                match best_seq {
                    Some(best) if seq > best => best_seq = Some(seq),
                    None => best_seq = Some(seq),
                    _ => {}
                }
            }
        }
    }

    match best_seq {
        Some(seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// Decode a snapshot into a TrackerState, validating everything:
/// strict deserialization, store invariants, and the recorded hash.
///
/// This is the safe entry point for loading state from untrusted sources.
pub fn restore_state(snap: &Snapshot) -> Result<TrackerState, RuntimeError> {
    let state: TrackerState = serde_json::from_str(&snap.state_json)
        .map_err(|e| RuntimeError::SnapshotDecode(e.to_string()))?;

    validate_invariants(&state).map_err(RuntimeError::SnapshotInvariant)?;

    let computed = canonical_hash(&state);
    if computed != snap.hash {
        return Err(RuntimeError::SnapshotHashMismatch {
            recorded: snap.hash.clone(),
            computed,
        });
    }

    Ok(state)
}
