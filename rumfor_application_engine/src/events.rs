/// Rumfor Market Tracker — Event Definitions
///
/// Events are pure data. They carry intent and payload only.
/// They contain ZERO transition logic.
///
/// Schema version is locked at 1. Events with schema_version != 1
/// are rejected by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ApplicationStatus, MarketAvailability};

/// Schema version for v1 tracker events. Hardcoded, never changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Event envelope. Timestamps are caller-supplied opaque strings so the
/// kernel never reads a clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub timestamp: String,
    pub logical_time: u64,
    pub schema_version: u32,
    pub kind: EventKind,
}

/// The three operations the tracker records against applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventKind {
    /// A vendor opens a draft application against a market.
    CreateApplication {
        application_id: String,
        vendor_id: String,
        market_id: String,
        /// Availability of the market at submission time, as observed
        /// by the caller. Creation is denied unless the market is
        /// accepting applications.
        availability: MarketAvailability,
        notes: String,
    },
    /// A status change request, validated against the transition table.
    TransitionStatus {
        application_id: String,
        to: ApplicationStatus,
        /// Acting promoter. Required for approved/rejected decisions.
        reviewer: Option<String>,
        review_notes: String,
    },
    /// Vendor edits their notes; only legal before review starts.
    UpdateNotes {
        application_id: String,
        notes: String,
    },
}

impl EventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::CreateApplication { .. } => "create_application",
            EventKind::TransitionStatus { .. } => "transition_status",
            EventKind::UpdateNotes { .. } => "update_notes",
        }
    }

    pub fn application_id(&self) -> &str {
        match self {
            EventKind::CreateApplication { application_id, .. }
            | EventKind::TransitionStatus { application_id, .. }
            | EventKind::UpdateNotes { application_id, .. } => application_id,
        }
    }
}

impl EventEnvelope {
    /// History entry recorded into the state after a successful apply.
    pub fn to_history_value(&self) -> Value {
        serde_json::json!({
            "event_type": self.kind.event_type(),
            "sequence": self.sequence,
            "timestamp": self.timestamp,
            "logical_time": self.logical_time,
            "payload": serde_json::to_value(&self.kind)
                .expect("event serialization failed"),
        })
    }
}
