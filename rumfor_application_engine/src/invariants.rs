/// Rumfor Market Tracker — Invariant Checks
///
/// Run after every applied event and on snapshot restore.
/// Returns `Err(message)` on the first failure, `Ok(())` if all pass.

use std::collections::BTreeSet;

use crate::domain::{ApplicationStatus, TrackerState};

/// Run all invariant checks against a tracker state.
pub fn validate_invariants(state: &TrackerState) -> Result<(), String> {
    check_id_format(state)?;
    check_unique_vendor_market(state)?;
    check_decisions_have_reviewer(state)?;
    check_sequence_order(state)?;
    check_history_covers_updates(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn well_formed_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Every id must be non-empty ASCII [a-zA-Z0-9_-].
fn check_id_format(state: &TrackerState) -> Result<(), String> {
    for (key, app) in &state.applications {
        if key != &app.id {
            return Err(format!(
                "[INVARIANT:id_format] Application keyed as {:?} carries id {:?}",
                key, app.id
            ));
        }
        for id in [&app.id, &app.vendor_id, &app.market_id] {
            if !well_formed_id(id) {
                return Err(format!(
                    "[INVARIANT:id_format] Id {:?} is not [a-zA-Z0-9_-]+",
                    id
                ));
            }
        }
    }
    Ok(())
}

/// At most one application per (vendor, market) pair.
fn check_unique_vendor_market(state: &TrackerState) -> Result<(), String> {
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for app in state.applications.values() {
        let pair = (app.vendor_id.as_str(), app.market_id.as_str());
        if !seen.insert(pair) {
            return Err(format!(
                "[INVARIANT:unique_vendor_market] Vendor {:?} has multiple applications \
                 for market {:?}",
                app.vendor_id, app.market_id
            ));
        }
    }
    Ok(())
}

/// Approved and rejected records must name the reviewer who decided.
fn check_decisions_have_reviewer(state: &TrackerState) -> Result<(), String> {
    for app in state.applications.values() {
        let decided = matches!(
            app.status,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        );
        if decided && app.reviewed_by.is_none() {
            return Err(format!(
                "[INVARIANT:decision_reviewer] Application {:?} is {} without a reviewer",
                app.id, app.status
            ));
        }
    }
    Ok(())
}

/// An application cannot be updated before it was created.
fn check_sequence_order(state: &TrackerState) -> Result<(), String> {
    for app in state.applications.values() {
        if app.updated_sequence < app.created_sequence {
            return Err(format!(
                "[INVARIANT:sequence_order] Application {:?} updated at sequence {} \
                 before creation at {}",
                app.id, app.updated_sequence, app.created_sequence
            ));
        }
    }
    Ok(())
}

/// Every recorded update must be covered by the event history.
fn check_history_covers_updates(state: &TrackerState) -> Result<(), String> {
    if state.applications.is_empty() {
        return Ok(());
    }
    let last_recorded = state
        .event_history
        .last()
        .and_then(|v| v.get("sequence"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| {
            "[INVARIANT:history_coverage] Applications present but event history is empty \
             or unsequenced"
                .to_string()
        })?;
    for app in state.applications.values() {
        if app.updated_sequence > last_recorded {
            return Err(format!(
                "[INVARIANT:history_coverage] Application {:?} updated at sequence {} \
                 beyond last recorded event {}",
                app.id, app.updated_sequence, last_recorded
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Application;

    fn valid_application(id: &str, vendor: &str, market: &str) -> Application {
        Application {
            id: id.to_string(),
            vendor_id: vendor.to_string(),
            market_id: market.to_string(),
            status: ApplicationStatus::Draft,
            notes: String::new(),
            review_notes: String::new(),
            reviewed_by: None,
            created_sequence: 1,
            updated_sequence: 1,
        }
    }

    fn state_with(apps: Vec<Application>) -> TrackerState {
        let mut state = TrackerState::default();
        let last_seq = apps.iter().map(|a| a.updated_sequence).max().unwrap_or(0);
        for app in apps {
            state.applications.insert(app.id.clone(), app);
        }
        state
            .event_history
            .push(serde_json::json!({ "event_type": "create_application", "sequence": last_seq }));
        state
    }

    #[test]
    fn valid_state_passes() {
        let state = state_with(vec![valid_application("app-1", "vendor-1", "market-1")]);
        validate_invariants(&state).unwrap();
    }

    #[test]
    fn malformed_id_is_rejected() {
        let state = state_with(vec![valid_application("app 1", "vendor-1", "market-1")]);
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.contains("id_format"), "{err}");
    }

    #[test]
    fn duplicate_vendor_market_pair_is_rejected() {
        let state = state_with(vec![
            valid_application("app-1", "vendor-1", "market-1"),
            valid_application("app-2", "vendor-1", "market-1"),
        ]);
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.contains("unique_vendor_market"), "{err}");
    }

    #[test]
    fn approval_without_reviewer_is_rejected() {
        let mut app = valid_application("app-1", "vendor-1", "market-1");
        app.status = ApplicationStatus::Approved;
        let state = state_with(vec![app]);
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.contains("decision_reviewer"), "{err}");
    }

    #[test]
    fn update_beyond_history_is_rejected() {
        let mut app = valid_application("app-1", "vendor-1", "market-1");
        app.updated_sequence = 9;
        let mut state = TrackerState::default();
        state.applications.insert(app.id.clone(), app);
        state
            .event_history
            .push(serde_json::json!({ "event_type": "create_application", "sequence": 1 }));
        let err = validate_invariants(&state).unwrap_err();
        assert!(err.contains("history_coverage"), "{err}");
    }
}
