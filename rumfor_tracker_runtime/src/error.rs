//! Runtime error taxonomy.
//!
//! Kernel rejections pass through unchanged; everything the runtime adds
//! (I/O, framing, snapshots, stale-status races) gets its own variant.

use thiserror::Error;

use rumfor_application_engine::domain::ApplicationStatus;
use rumfor_application_engine::error::{EngineError, UnknownStatus};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("event log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    #[error("event log sequence violation: expected {expected}, got {got}")]
    LogSequenceViolation { expected: u64, got: u64 },

    #[error("corrupt event log frame: {0}")]
    CorruptFrame(String),

    #[error("snapshot encode failed: {0}")]
    SnapshotEncode(String),

    #[error("snapshot decode failed: {0}")]
    SnapshotDecode(String),

    #[error("snapshot violates store invariants: {0}")]
    SnapshotInvariant(String),

    #[error("snapshot hash mismatch: recorded {recorded}, computed {computed}")]
    SnapshotHashMismatch { recorded: String, computed: String },

    #[error(
        "stale status for application {application_id:?}: expected {expected}, found {actual}"
    )]
    StaleStatus {
        application_id: String,
        expected: ApplicationStatus,
        actual: ApplicationStatus,
    },

    #[error("replay determinism failure: {run1} vs {run2}")]
    Determinism { run1: String, run2: String },
}
