#![forbid(unsafe_code)]

//! Rumfor Market Tracker — Runtime
//!
//! Wraps the deterministic status kernel with persistence, replay,
//! snapshots, session management, and drift detection.
//!
//! No domain logic lives here — all transitions and invariants
//! are delegated to the kernel.

pub mod error;
pub mod proto_types;
pub mod proto_bridge;
pub mod event_store;
pub mod replay;
pub mod snapshot;
pub mod session;
pub mod drift;
