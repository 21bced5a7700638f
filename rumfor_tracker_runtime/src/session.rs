//! Session manager — isolated sessions with persist-after-apply semantics.
//!
//! Each session gets its own directory with an event log and snapshots.
//! Concurrency: Mutex for write serialization, no global mutable state.
//!
//! Apply-before-persist order:
//!   1. engine.apply_event(event)  — rejected events never reach the log
//!   2. event_store.append_event() — only if step 1 succeeded
//!   3. snapshot if interval reached
//!
//! The session is the serialization point for racing status updates:
//! `transition_checked` re-reads the stored status and refuses to act on
//! a status the caller no longer holds.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use rumfor_application_engine::domain::{
    ApplicationStatus, MarketAvailability, TrackerState, TransitionOutcome,
};
use rumfor_application_engine::engine::TrackerEngine;
use rumfor_application_engine::error::EngineError;
use rumfor_application_engine::events::{EventEnvelope, EventKind, SCHEMA_VERSION};
use rumfor_application_engine::hashing::canonical_hash;

use crate::error::RuntimeError;
use crate::event_store::EventStore;
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel};
use crate::replay;
use crate::snapshot;

/// An isolated tracker session with its own event log and state.
pub struct Session {
    session_id: String,
    base_dir: PathBuf,
    engine: TrackerEngine,
    event_store: EventStore,
    snapshot_interval: u64,
}

impl Session {
    /// Open a session in the given base directory, replaying any
    /// existing event log.
    ///
    /// Directory structure:
    ///   <base_dir>/<session_id>/events.log
    ///   <base_dir>/<session_id>/snapshots/
    pub fn open(
        base_dir: &Path,
        session_id: &str,
        snapshot_interval: u64,
    ) -> Result<Self, RuntimeError> {
        let session_dir = base_dir.join(session_id);
        let events_path = session_dir.join("events.log");

        let event_store = EventStore::open(&events_path)?;

        let mut engine = TrackerEngine::new();
        if event_store.last_sequence() > 0 {
            let proto_events = event_store.load_all_events()?;
            for pe in &proto_events {
                let ke = proto_to_kernel(pe)?;
                engine.apply_event(&ke)?;
            }
        }

        Ok(Self {
            session_id: session_id.to_string(),
            base_dir: session_dir,
            engine,
            event_store,
            snapshot_interval,
        })
    }

    /// Apply a single event: validate via kernel, then persist.
    ///
    /// Returns (state_clone, outcome). Rejected events leave both the
    /// engine and the log untouched.
    pub fn apply_event(
        &mut self,
        event: &EventEnvelope,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        // Step 1: apply to kernel.
        let (state, outcome) = match self.engine.apply_event(event) {
            Ok((state, outcome)) => (state.clone(), outcome),
            Err(e) => {
                warn!(
                    session = %self.session_id,
                    sequence = event.sequence,
                    error = %e,
                    "event rejected"
                );
                return Err(e.into());
            }
        };

        // Step 2: persist to event log (only if step 1 succeeded).
        let proto = kernel_to_proto(event);
        self.event_store.append_event(&proto)?;

        // Step 3: auto-snapshot at interval.
        if self.snapshot_interval > 0 && event.sequence % self.snapshot_interval == 0 {
            let snap_dir = self.base_dir.join("snapshots");
            snapshot::save_snapshot(&snap_dir, event.sequence, &state)?;
        }

        debug!(
            session = %self.session_id,
            sequence = event.sequence,
            event_type = %outcome.event_type,
            "event applied"
        );
        Ok((state, outcome))
    }

    fn next_envelope(&self, timestamp: &str, kind: EventKind) -> EventEnvelope {
        let sequence = self.engine.last_sequence() + 1;
        EventEnvelope {
            sequence,
            timestamp: timestamp.to_string(),
            logical_time: sequence,
            schema_version: SCHEMA_VERSION,
            kind,
        }
    }

    /// Open a draft application for a vendor against a market.
    pub fn create_application(
        &mut self,
        timestamp: &str,
        application_id: &str,
        vendor_id: &str,
        market_id: &str,
        availability: MarketAvailability,
        notes: &str,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let event = self.next_envelope(
            timestamp,
            EventKind::CreateApplication {
                application_id: application_id.to_string(),
                vendor_id: vendor_id.to_string(),
                market_id: market_id.to_string(),
                availability,
                notes: notes.to_string(),
            },
        );
        self.apply_event(&event)
    }

    /// Request a status change without a freshness guard.
    pub fn transition(
        &mut self,
        timestamp: &str,
        application_id: &str,
        to: ApplicationStatus,
        reviewer: Option<&str>,
        review_notes: &str,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let event = self.next_envelope(
            timestamp,
            EventKind::TransitionStatus {
                application_id: application_id.to_string(),
                to,
                reviewer: reviewer.map(str::to_string),
                review_notes: review_notes.to_string(),
            },
        );
        self.apply_event(&event)
    }

    /// Request a status change, guarded by the status the caller observed.
    ///
    /// Compare-and-swap semantics: if the stored status no longer matches
    /// `expected`, the request fails with `StaleStatus` and nothing is
    /// recorded. Two racing updates from the same observed status cannot
    /// both succeed.
    pub fn transition_checked(
        &mut self,
        timestamp: &str,
        application_id: &str,
        expected: ApplicationStatus,
        to: ApplicationStatus,
        reviewer: Option<&str>,
        review_notes: &str,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let actual = self
            .engine
            .state()
            .applications
            .get(application_id)
            .map(|a| a.status)
            .ok_or_else(|| {
                RuntimeError::Engine(EngineError::UnknownApplication(
                    application_id.to_string(),
                ))
            })?;
        if actual != expected {
            warn!(
                session = %self.session_id,
                application_id,
                expected = %expected,
                actual = %actual,
                "stale status transition refused"
            );
            return Err(RuntimeError::StaleStatus {
                application_id: application_id.to_string(),
                expected,
                actual,
            });
        }
        self.transition(timestamp, application_id, to, reviewer, review_notes)
    }

    /// Vendor edits their notes (legal only before review starts).
    pub fn update_notes(
        &mut self,
        timestamp: &str,
        application_id: &str,
        notes: &str,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let event = self.next_envelope(
            timestamp,
            EventKind::UpdateNotes {
                application_id: application_id.to_string(),
                notes: notes.to_string(),
            },
        );
        self.apply_event(&event)
    }

    /// Full replay from the event log — reset engine and replay all events.
    pub fn replay_full(&mut self) -> Result<(TrackerState, String), RuntimeError> {
        let proto_events = self.event_store.load_all_events()?;
        let kernel_events = proto_events
            .iter()
            .map(proto_to_kernel)
            .collect::<Result<Vec<_>, _>>()?;

        let (state, hash) = replay::rebuild_state(&kernel_events)?;

        let mut engine = TrackerEngine::new();
        engine.replay(&kernel_events)?;
        self.engine = engine;

        Ok((state, hash))
    }

    /// Current state from the engine.
    pub fn state(&self) -> &TrackerState {
        self.engine.state()
    }

    /// Current canonical hash.
    pub fn current_hash(&self) -> String {
        canonical_hash(self.engine.state())
    }

    /// Sequence of the last applied event.
    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    /// SHA-256 digest of the raw event log file.
    pub fn log_digest(&self) -> Result<String, RuntimeError> {
        self.event_store.log_digest()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Apply event under lock.
    pub fn apply_event(
        &self,
        event: &EventEnvelope,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let mut session = self.inner.lock().expect("session lock poisoned");
        session.apply_event(event)
    }

    /// Guarded transition under lock — the compare-and-swap and the
    /// status write happen inside one critical section.
    pub fn transition_checked(
        &self,
        timestamp: &str,
        application_id: &str,
        expected: ApplicationStatus,
        to: ApplicationStatus,
        reviewer: Option<&str>,
        review_notes: &str,
    ) -> Result<(TrackerState, TransitionOutcome), RuntimeError> {
        let mut session = self.inner.lock().expect("session lock poisoned");
        session.transition_checked(timestamp, application_id, expected, to, reviewer, review_notes)
    }

    /// Current hash under lock.
    pub fn current_hash(&self) -> String {
        let session = self.inner.lock().expect("session lock poisoned");
        session.current_hash()
    }

    /// Current sequence under lock.
    pub fn current_sequence(&self) -> u64 {
        let session = self.inner.lock().expect("session lock poisoned");
        session.current_sequence()
    }
}
