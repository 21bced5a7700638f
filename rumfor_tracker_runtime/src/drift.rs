//! Drift detection — determinism verification and store comparison.
//!
//! The comparison side feeds the tracker's status dashboards: per-status
//! counts plus the concrete applications that appeared, vanished, or
//! changed status between two states.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use rumfor_application_engine::domain::{ApplicationStatus, TrackerState};
use rumfor_application_engine::events::EventEnvelope;

use crate::error::RuntimeError;
use crate::replay;

/// Verify determinism by replaying the same events twice and
/// comparing canonical hashes.
pub fn verify_determinism(events: &[EventEnvelope]) -> Result<(), RuntimeError> {
    let (_, hash1) = replay::rebuild_state(events)?;
    let (_, hash2) = replay::rebuild_state(events)?;

    if hash1 != hash2 {
        return Err(RuntimeError::Determinism {
            run1: hash1,
            run2: hash2,
        });
    }
    Ok(())
}

/// Count applications per status.
pub fn status_counts(state: &TrackerState) -> BTreeMap<ApplicationStatus, u64> {
    let mut counts = BTreeMap::new();
    for app in state.applications.values() {
        *counts.entry(app.status).or_insert(0) += 1;
    }
    counts
}

/// A single application whose status differs between two states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub application_id: String,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Structured comparison of two tracker states.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub counts_a: BTreeMap<ApplicationStatus, u64>,
    pub counts_b: BTreeMap<ApplicationStatus, u64>,
    pub added_applications: Vec<String>,
    pub removed_applications: Vec<String>,
    pub status_changes: Vec<StatusChange>,
}

/// Compare two states, reporting lifecycle movement between them.
pub fn compare_states(state_a: &TrackerState, state_b: &TrackerState) -> DriftReport {
    let ids_a: BTreeSet<&str> = state_a.applications.keys().map(|s| s.as_str()).collect();
    let ids_b: BTreeSet<&str> = state_b.applications.keys().map(|s| s.as_str()).collect();

    let added: Vec<String> = ids_b.difference(&ids_a).map(|s| s.to_string()).collect();
    let removed: Vec<String> = ids_a.difference(&ids_b).map(|s| s.to_string()).collect();

    let mut status_changes = Vec::new();
    for id in ids_a.intersection(&ids_b) {
        let before = state_a.applications[*id].status;
        let after = state_b.applications[*id].status;
        if before != after {
            status_changes.push(StatusChange {
                application_id: id.to_string(),
                from: before,
                to: after,
            });
        }
    }

    DriftReport {
        counts_a: status_counts(state_a),
        counts_b: status_counts(state_b),
        added_applications: added,
        removed_applications: removed,
        status_changes,
    }
}
