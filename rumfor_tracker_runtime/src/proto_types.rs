//! Hand-written protobuf types for the tracker event log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Statuses travel as their kebab-case wire strings; the bridge parses
//! them back into kernel types and rejects unknown values.

use prost::Message;

// ── Event Envelope ─────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEventEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub logical_time: u64,
    #[prost(string, tag = "3")]
    pub timestamp: String,
    #[prost(message, optional, tag = "4")]
    pub event: Option<ProtoEvent>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEvent {
    #[prost(oneof = "EventKind", tags = "1, 2, 3")]
    pub kind: Option<EventKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum EventKind {
    #[prost(message, tag = "1")]
    CreateApplication(CreateApplication),
    #[prost(message, tag = "2")]
    TransitionStatus(TransitionStatus),
    #[prost(message, tag = "3")]
    UpdateNotes(UpdateNotes),
}

// ── Event Types ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct CreateApplication {
    #[prost(string, tag = "1")]
    pub application_id: String,
    #[prost(string, tag = "2")]
    pub vendor_id: String,
    #[prost(string, tag = "3")]
    pub market_id: String,
    #[prost(string, tag = "4")]
    pub availability: String,
    #[prost(string, tag = "5")]
    pub notes: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransitionStatus {
    #[prost(string, tag = "1")]
    pub application_id: String,
    #[prost(string, tag = "2")]
    pub to: String,
    #[prost(string, optional, tag = "3")]
    pub reviewer: Option<String>,
    #[prost(string, tag = "4")]
    pub review_notes: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct UpdateNotes {
    #[prost(string, tag = "1")]
    pub application_id: String,
    #[prost(string, tag = "2")]
    pub notes: String,
}
