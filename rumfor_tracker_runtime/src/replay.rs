//! Replay orchestrator — rebuild the application store from an event log.
//!
//! Delegates all domain logic to the status kernel.
//! No shortcuts, no cached state logic.

use rumfor_application_engine::domain::TrackerState;
use rumfor_application_engine::engine::TrackerEngine;
use rumfor_application_engine::error::EngineError;
use rumfor_application_engine::events::EventEnvelope;
use rumfor_application_engine::hashing::canonical_hash;

/// Rebuild the tracker state from a sequence of events.
///
/// 1. Create a fresh engine
/// 2. Pass each event sequentially to the kernel
/// 3. Return (final_state, canonical_hash)
///
/// This is a pure function on the event stream — deterministic by
/// the kernel's guarantee.
pub fn rebuild_state(events: &[EventEnvelope]) -> Result<(TrackerState, String), EngineError> {
    let mut engine = TrackerEngine::new();
    engine.replay(events)?;

    let state = engine.state().clone();
    let hash = canonical_hash(&state);
    Ok((state, hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(events: &[EventEnvelope]) -> Result<String, EngineError> {
    let (_, hash) = rebuild_state(events)?;
    Ok(hash)
}
