/// Rumfor Market Tracker — Kernel Error Taxonomy
///
/// Every rejection is a typed, recoverable value. The kernel never panics
/// on bad input; the caller decides whether to surface or abort.

use thiserror::Error;

use crate::domain::{ApplicationStatus, MarketAvailability};

/// A string outside the closed status vocabulary of its domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status value: {0:?}")]
pub struct UnknownStatus(pub String);

/// A status change the transition table does not admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid application status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// All ways the engine can reject an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersionMismatch { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("application {0:?} does not exist")]
    UnknownApplication(String),

    #[error("application {0:?} already exists")]
    DuplicateApplication(String),

    #[error("vendor {vendor_id:?} already has an application for market {market_id:?}")]
    DuplicateVendorMarket { vendor_id: String, market_id: String },

    #[error("market {market_id:?} is not accepting applications (availability: {availability})")]
    MarketNotAccepting {
        market_id: String,
        availability: MarketAvailability,
    },

    #[error("transition to {to} requires a reviewer")]
    MissingReviewer { to: ApplicationStatus },

    #[error("notes are locked once review starts (current status: {status})")]
    NotesLocked { status: ApplicationStatus },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
