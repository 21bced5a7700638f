/// Rumfor Market Tracker — Engine
///
/// Top-level orchestrator. Delegates mutation to transitions,
/// validates via invariants.
///
/// Strict sequence enforcement. Every rejection is a typed error value;
/// the engine never panics on bad input.

use crate::domain::{TrackerState, TransitionOutcome};
use crate::error::EngineError;
use crate::events::{EventEnvelope, SCHEMA_VERSION};
use crate::invariants::validate_invariants;
use crate::transitions::apply_event as transition_apply;

/// Stateful engine wrapping the pure functional transition layer.
#[derive(Debug, Default)]
pub struct TrackerEngine {
    state: TrackerState,
    last_sequence: u64,
}

impl TrackerEngine {
    /// Create a new engine with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the current state.
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Sequence number of the last applied event (0 if none).
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Apply a single event:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Delegate to transitions::apply_event
    ///   4. Validate invariants on the new state
    ///   5. Commit and return
    ///
    /// On any error the stored state is left untouched.
    pub fn apply_event(
        &mut self,
        event: &EventEnvelope,
    ) -> Result<(&TrackerState, TransitionOutcome), EngineError> {
        if event.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                got: event.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if event.sequence != expected {
            return Err(EngineError::SequenceViolation {
                expected,
                got: event.sequence,
            });
        }

        let (new_state, outcome) = transition_apply(&self.state, event)?;
        validate_invariants(&new_state).map_err(EngineError::InvariantViolation)?;

        self.state = new_state;
        self.last_sequence = event.sequence;

        Ok((&self.state, outcome))
    }

    /// Apply an ordered sequence of events, stopping at the first rejection.
    pub fn apply_sequence(
        &mut self,
        events: &[EventEnvelope],
    ) -> Result<&TrackerState, EngineError> {
        for event in events {
            self.apply_event(event)?;
        }
        Ok(&self.state)
    }

    /// Event-sourced reconstruction: reset and replay.
    pub fn replay(&mut self, events: &[EventEnvelope]) -> Result<&TrackerState, EngineError> {
        self.state = TrackerState::default();
        self.last_sequence = 0;
        for event in events {
            self.apply_event(event)?;
        }
        Ok(&self.state)
    }
}
