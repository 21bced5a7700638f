//! Integration tests for rumfor_tracker_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;

use tempfile::TempDir;

use rumfor_application_engine::domain::{ApplicationStatus, MarketAvailability};
use rumfor_application_engine::events::{EventEnvelope, EventKind, SCHEMA_VERSION};

use rumfor_tracker_runtime::error::RuntimeError;
use rumfor_tracker_runtime::event_store::EventStore;
use rumfor_tracker_runtime::proto_bridge::{kernel_to_proto, proto_to_kernel};
use rumfor_tracker_runtime::replay;
use rumfor_tracker_runtime::session::Session;
use rumfor_tracker_runtime::snapshot;

const TS: &str = "2026-03-01T09:00:00Z";

fn envelope(sequence: u64, kind: EventKind) -> EventEnvelope {
    EventEnvelope {
        sequence,
        timestamp: TS.to_string(),
        logical_time: sequence,
        schema_version: SCHEMA_VERSION,
        kind,
    }
}

fn create(sequence: u64, app: &str, vendor: &str, market: &str) -> EventEnvelope {
    envelope(
        sequence,
        EventKind::CreateApplication {
            application_id: app.to_string(),
            vendor_id: vendor.to_string(),
            market_id: market.to_string(),
            availability: MarketAvailability::AcceptingApplications,
            notes: String::new(),
        },
    )
}

fn transition(
    sequence: u64,
    app: &str,
    to: ApplicationStatus,
    reviewer: Option<&str>,
) -> EventEnvelope {
    envelope(
        sequence,
        EventKind::TransitionStatus {
            application_id: app.to_string(),
            to,
            reviewer: reviewer.map(str::to_string),
            review_notes: String::new(),
        },
    )
}

fn sample_events() -> Vec<EventEnvelope> {
    vec![
        create(1, "app-1", "vendor-1", "market-1"),
        create(2, "app-2", "vendor-2", "market-1"),
        transition(3, "app-1", ApplicationStatus::Submitted, None),
        transition(4, "app-1", ApplicationStatus::UnderReview, Some("promoter-1")),
        transition(5, "app-2", ApplicationStatus::Submitted, None),
        transition(6, "app-1", ApplicationStatus::Approved, Some("promoter-1")),
    ]
}

#[test]
fn append_and_replay_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let events = sample_events();

    let log_path = dir.path().join("events.log");
    {
        let mut store = EventStore::open(&log_path).unwrap();
        for evt in &events {
            store.append_event(&kernel_to_proto(evt)).unwrap();
        }
    }

    let store = EventStore::open(&log_path).unwrap();
    assert_eq!(store.last_sequence(), events.len() as u64);

    let loaded = store.load_all_events().unwrap();
    let kernel_events: Vec<EventEnvelope> = loaded
        .iter()
        .map(|p| proto_to_kernel(p).unwrap())
        .collect();
    assert_eq!(kernel_events, events);

    let (_, hash1) = replay::rebuild_state(&kernel_events).unwrap();
    let (_, hash2) = replay::rebuild_state(&kernel_events).unwrap();
    assert_eq!(hash1, hash2);
}

#[test]
fn out_of_order_append_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut store = EventStore::open(&dir.path().join("events.log")).unwrap();
    store
        .append_event(&kernel_to_proto(&create(1, "app-1", "vendor-1", "market-1")))
        .unwrap();
    let err = store
        .append_event(&kernel_to_proto(&transition(
            5,
            "app-1",
            ApplicationStatus::Submitted,
            None,
        )))
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::LogSequenceViolation { expected: 2, got: 5 }
    ));
}

#[test]
fn session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (hash_before, digest_before) = {
        let mut session = Session::open(dir.path(), "main", 0).unwrap();
        for evt in sample_events() {
            session.apply_event(&evt).unwrap();
        }
        (session.current_hash(), session.log_digest().unwrap())
    };

    let session = Session::open(dir.path(), "main", 0).unwrap();
    assert_eq!(session.current_hash(), hash_before);
    assert_eq!(session.log_digest().unwrap(), digest_before);
    assert_eq!(session.current_sequence(), 6);
    assert_eq!(
        session.state().applications["app-1"].status,
        ApplicationStatus::Approved
    );
}

#[test]
fn sessions_are_isolated() {
    let dir = TempDir::new().unwrap();
    let events = sample_events();

    let mut session_a = Session::open(dir.path(), "session_a", 0).unwrap();
    let mut session_b = Session::open(dir.path(), "session_b", 0).unwrap();

    for evt in &events {
        session_a.apply_event(evt).unwrap();
    }
    for evt in &events[..2] {
        session_b.apply_event(evt).unwrap();
    }

    assert_ne!(session_a.current_hash(), session_b.current_hash());
    assert_eq!(session_a.current_sequence(), events.len() as u64);
    assert_eq!(session_b.current_sequence(), 2);
}

#[test]
fn stale_status_is_refused() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(dir.path(), "main", 0).unwrap();
    session
        .create_application(TS, "app-1", "vendor-1", "market-1",
            MarketAvailability::AcceptingApplications, "")
        .unwrap();
    session
        .transition(TS, "app-1", ApplicationStatus::Submitted, None, "")
        .unwrap();

    // A caller who still believes the application is a draft loses the race.
    let err = session
        .transition_checked(
            TS,
            "app-1",
            ApplicationStatus::Draft,
            ApplicationStatus::Withdrawn,
            None,
            "",
        )
        .unwrap_err();
    assert!(matches!(err, RuntimeError::StaleStatus { .. }));

    // A caller holding the real status goes through.
    session
        .transition_checked(
            TS,
            "app-1",
            ApplicationStatus::Submitted,
            ApplicationStatus::Withdrawn,
            None,
            "",
        )
        .unwrap();
    assert_eq!(
        session.state().applications["app-1"].status,
        ApplicationStatus::Withdrawn
    );
}

#[test]
fn rejected_event_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(dir.path(), "main", 0).unwrap();
    session
        .create_application(TS, "app-1", "vendor-1", "market-1",
            MarketAvailability::AcceptingApplications, "")
        .unwrap();

    // draft -> approved is illegal; neither engine nor log may advance.
    let err = session
        .transition(TS, "app-1", ApplicationStatus::Approved, Some("promoter-1"), "")
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Engine(_)));
    assert_eq!(session.current_sequence(), 1);

    let (state, hash) = session.replay_full().unwrap();
    assert_eq!(state.applications["app-1"].status, ApplicationStatus::Draft);
    assert_eq!(hash, session.current_hash());
}

#[test]
fn corrupted_log_is_detected() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("events.log");
    {
        let mut store = EventStore::open(&log_path).unwrap();
        for evt in &sample_events() {
            store.append_event(&kernel_to_proto(evt)).unwrap();
        }
    }

    // Truncate the tail to corrupt the final frame.
    let data = fs::read(&log_path).unwrap();
    fs::write(&log_path, &data[..data.len() - 10]).unwrap();

    match EventStore::open(&log_path) {
        Ok(store) => assert!(store.load_all_events().is_err()),
        Err(_) => {} // corruption detected at open time
    }
}

#[test]
fn snapshot_replay_parity() {
    let dir = TempDir::new().unwrap();
    let events = sample_events();

    // Snapshot every 3 events.
    let mut session = Session::open(dir.path(), "main", 3).unwrap();
    for evt in &events {
        session.apply_event(evt).unwrap();
    }

    let snap_dir = dir.path().join("main").join("snapshots");
    let latest = snapshot::load_latest_snapshot(&snap_dir)
        .unwrap()
        .expect("auto-snapshot should exist");
    assert_eq!(latest.sequence, 6);
    assert_eq!(latest.hash, session.current_hash());

    let restored = snapshot::restore_state(&latest).unwrap();
    let (replayed, replay_hash) = session.replay_full().unwrap();
    assert_eq!(restored.applications, replayed.applications);
    assert_eq!(latest.hash, replay_hash);
}
