/// Rumfor Market Tracker — Centralized Transition Logic
///
/// ALL state-mutation logic lives here.
///
/// The transition table is the single source of truth for application
/// status updates:
///   - draft        -> submitted
///   - submitted    -> under-review | approved | rejected | withdrawn
///   - under-review -> approved | rejected | withdrawn
///   - approved / rejected / withdrawn are terminal
///   - a self-transition is always admitted (idempotent confirmation)

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::domain::{
    Application, ApplicationStatus, MarketAvailability, TrackerState, TransitionOutcome,
};
use crate::error::{EngineError, InvalidTransition};
use crate::events::{EventEnvelope, EventKind};

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Allowed successors of *from*, in documentation order. Empty for
/// terminal states. O(1).
pub fn successors(from: ApplicationStatus) -> &'static [ApplicationStatus] {
    use ApplicationStatus::*;
    match from {
        Draft => &[Submitted],
        Submitted => &[UnderReview, Approved, Rejected, Withdrawn],
        UnderReview => &[Approved, Rejected, Withdrawn],
        Approved | Rejected | Withdrawn => &[],
    }
}

/// A terminal status has no outgoing transitions except to itself.
pub fn is_terminal(status: ApplicationStatus) -> bool {
    successors(status).is_empty()
}

/// Pure admissibility check. Total, never panics, no side effects.
pub fn is_valid_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    from == to || successors(from).contains(&to)
}

/// Asserting form of `is_valid_transition` — the failure carries both
/// endpoints. Mutating nothing is the caller's guarantee to keep.
pub fn assert_valid_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<(), InvalidTransition> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(InvalidTransition { from, to })
    }
}

/// Legacy string-keyed check, total over arbitrary strings.
///
/// Anything outside the six application statuses — including the market
/// availability vocabulary (`open`, `accepting-applications`, `closed`)
/// — silently denies, even for `from == to`. Market values never permit
/// application transitions.
pub fn is_valid_transition_str(from: &str, to: &str) -> bool {
    match (
        ApplicationStatus::from_str(from),
        ApplicationStatus::from_str(to),
    ) {
        (Ok(f), Ok(t)) => is_valid_transition(f, t),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply *event* to *state* and return `(new_state, outcome)`.
/// The original state is never mutated — a deep clone is made first.
pub fn apply_event(
    state: &TrackerState,
    event: &EventEnvelope,
) -> Result<(TrackerState, TransitionOutcome), EngineError> {
    let mut new_state = state.clone();

    let outcome = match &event.kind {
        EventKind::CreateApplication {
            application_id,
            vendor_id,
            market_id,
            availability,
            notes,
        } => apply_create(
            &mut new_state,
            event.sequence,
            application_id,
            vendor_id,
            market_id,
            *availability,
            notes,
        )?,
        EventKind::TransitionStatus {
            application_id,
            to,
            reviewer,
            review_notes,
        } => apply_transition(
            &mut new_state,
            event.sequence,
            application_id,
            *to,
            reviewer.as_deref(),
            review_notes,
        )?,
        EventKind::UpdateNotes {
            application_id,
            notes,
        } => apply_update_notes(&mut new_state, event.sequence, application_id, notes)?,
    };

    // Record event in history
    new_state.event_history.push(event.to_history_value());

    Ok((new_state, outcome))
}

// ---------------------------------------------------------------------------
// Individual event handlers (private)
// ---------------------------------------------------------------------------

fn apply_create(
    state: &mut TrackerState,
    sequence: u64,
    application_id: &str,
    vendor_id: &str,
    market_id: &str,
    availability: MarketAvailability,
    notes: &str,
) -> Result<TransitionOutcome, EngineError> {
    if state.applications.contains_key(application_id) {
        return Err(EngineError::DuplicateApplication(application_id.to_string()));
    }

    // One application per (vendor, market) pair.
    let pairs: BTreeSet<(&str, &str)> = state
        .applications
        .values()
        .map(|a| (a.vendor_id.as_str(), a.market_id.as_str()))
        .collect();
    if pairs.contains(&(vendor_id, market_id)) {
        return Err(EngineError::DuplicateVendorMarket {
            vendor_id: vendor_id.to_string(),
            market_id: market_id.to_string(),
        });
    }

    if availability != MarketAvailability::AcceptingApplications {
        return Err(EngineError::MarketNotAccepting {
            market_id: market_id.to_string(),
            availability,
        });
    }

    let application = Application {
        id: application_id.to_string(),
        vendor_id: vendor_id.to_string(),
        market_id: market_id.to_string(),
        status: ApplicationStatus::Draft,
        notes: notes.to_string(),
        review_notes: String::new(),
        reviewed_by: None,
        created_sequence: sequence,
        updated_sequence: sequence,
    };
    state
        .applications
        .insert(application.id.clone(), application);

    Ok(TransitionOutcome {
        event_type: "create_application".to_string(),
        application_id: application_id.to_string(),
        to: Some(ApplicationStatus::Draft),
        ..Default::default()
    })
}

fn apply_transition(
    state: &mut TrackerState,
    sequence: u64,
    application_id: &str,
    to: ApplicationStatus,
    reviewer: Option<&str>,
    review_notes: &str,
) -> Result<TransitionOutcome, EngineError> {
    let application = state
        .applications
        .get_mut(application_id)
        .ok_or_else(|| EngineError::UnknownApplication(application_id.to_string()))?;
    let from = application.status;

    assert_valid_transition(from, to)?;

    // Decisions are attributable: approvals and rejections name a reviewer.
    if matches!(to, ApplicationStatus::Approved | ApplicationStatus::Rejected)
        && reviewer.is_none()
    {
        return Err(EngineError::MissingReviewer { to });
    }

    if from == to {
        // Idempotent confirmation — admitted, recorded, record untouched.
        return Ok(TransitionOutcome {
            event_type: "transition_status".to_string(),
            application_id: application_id.to_string(),
            from: Some(from),
            to: Some(to),
            no_op: true,
        });
    }

    application.status = to;
    if let Some(reviewer) = reviewer {
        application.reviewed_by = Some(reviewer.to_string());
    }
    if !review_notes.is_empty() {
        application.review_notes = review_notes.to_string();
    }
    application.updated_sequence = sequence;

    Ok(TransitionOutcome {
        event_type: "transition_status".to_string(),
        application_id: application_id.to_string(),
        from: Some(from),
        to: Some(to),
        no_op: false,
    })
}

fn apply_update_notes(
    state: &mut TrackerState,
    sequence: u64,
    application_id: &str,
    notes: &str,
) -> Result<TransitionOutcome, EngineError> {
    let application = state
        .applications
        .get_mut(application_id)
        .ok_or_else(|| EngineError::UnknownApplication(application_id.to_string()))?;

    if !matches!(
        application.status,
        ApplicationStatus::Draft | ApplicationStatus::Submitted
    ) {
        return Err(EngineError::NotesLocked {
            status: application.status,
        });
    }

    application.notes = notes.to_string();
    application.updated_sequence = sequence;

    Ok(TransitionOutcome {
        event_type: "update_notes".to_string(),
        application_id: application_id.to_string(),
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Unit tests — the transition table contract
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn self_transition_is_always_valid() {
        for status in ApplicationStatus::ALL {
            assert!(is_valid_transition(status, status), "{status} -> {status}");
        }
    }

    #[test]
    fn terminal_states_admit_nothing_else() {
        for terminal in [Approved, Rejected, Withdrawn] {
            assert!(is_terminal(terminal));
            for to in ApplicationStatus::ALL {
                if to != terminal {
                    assert!(!is_valid_transition(terminal, to), "{terminal} -> {to}");
                }
            }
        }
    }

    #[test]
    fn draft_only_moves_to_submitted() {
        assert!(is_valid_transition(Draft, Submitted));
        assert!(!is_valid_transition(Draft, Approved));
        assert!(!is_valid_transition(Draft, UnderReview));
        assert!(!is_valid_transition(Draft, Rejected));
        assert!(!is_valid_transition(Draft, Withdrawn));
    }

    #[test]
    fn submitted_successors() {
        for to in [UnderReview, Approved, Rejected, Withdrawn] {
            assert!(is_valid_transition(Submitted, to), "submitted -> {to}");
        }
        // No backward transition.
        assert!(!is_valid_transition(Submitted, Draft));
    }

    #[test]
    fn under_review_successors() {
        for to in [Approved, Rejected, Withdrawn] {
            assert!(is_valid_transition(UnderReview, to));
        }
        assert!(!is_valid_transition(UnderReview, Draft));
        assert!(!is_valid_transition(UnderReview, Submitted));
    }

    #[test]
    fn market_values_never_permit_transitions() {
        assert!(!is_valid_transition_str("open", "submitted"));
        for to in ApplicationStatus::ALL {
            assert!(!is_valid_transition_str("accepting-applications", to.as_str()));
        }
        // Even reflexively — these are not application statuses at all.
        assert!(!is_valid_transition_str("closed", "closed"));
    }

    #[test]
    fn unknown_strings_silently_deny() {
        assert!(!is_valid_transition_str("booked", "cancelled"));
        assert!(!is_valid_transition_str("", "submitted"));
        assert!(is_valid_transition_str("draft", "submitted"));
        assert!(is_valid_transition_str("approved", "approved"));
    }

    #[test]
    fn assert_form_carries_both_endpoints() {
        let err = assert_valid_transition(Approved, Submitted).unwrap_err();
        assert_eq!(err, InvalidTransition { from: Approved, to: Submitted });
        assert_valid_transition(Draft, Submitted).unwrap();
    }

    #[test]
    fn assert_form_is_idempotent_for_every_status() {
        for status in ApplicationStatus::ALL {
            assert_valid_transition(status, status).unwrap();
        }
    }

    #[test]
    fn successor_lists_match_the_documented_table() {
        assert_eq!(successors(Draft), &[Submitted]);
        assert_eq!(successors(Submitted), &[UnderReview, Approved, Rejected, Withdrawn]);
        assert_eq!(successors(UnderReview), &[Approved, Rejected, Withdrawn]);
        assert!(successors(Approved).is_empty());
        assert!(successors(Rejected).is_empty());
        assert!(successors(Withdrawn).is_empty());
    }
}
