//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between protobuf wire types (proto_types.rs) and the
//! kernel's typed EventEnvelope. Statuses travel as kebab-case strings
//! on the wire; parsing back is fallible and unknown values surface as
//! corrupt-frame errors rather than being silently coerced.

use std::str::FromStr;

use rumfor_application_engine::domain::{ApplicationStatus, MarketAvailability};
use rumfor_application_engine::events::{self, EventEnvelope};

use crate::error::RuntimeError;
use crate::proto_types::{
    CreateApplication, EventKind, ProtoEvent, ProtoEventEnvelope, TransitionStatus, UpdateNotes,
};

/// Convert a kernel EventEnvelope to its protobuf wire form.
pub fn kernel_to_proto(event: &EventEnvelope) -> ProtoEventEnvelope {
    let kind = match &event.kind {
        events::EventKind::CreateApplication {
            application_id,
            vendor_id,
            market_id,
            availability,
            notes,
        } => EventKind::CreateApplication(CreateApplication {
            application_id: application_id.clone(),
            vendor_id: vendor_id.clone(),
            market_id: market_id.clone(),
            availability: availability.as_str().to_string(),
            notes: notes.clone(),
        }),
        events::EventKind::TransitionStatus {
            application_id,
            to,
            reviewer,
            review_notes,
        } => EventKind::TransitionStatus(TransitionStatus {
            application_id: application_id.clone(),
            to: to.as_str().to_string(),
            reviewer: reviewer.clone(),
            review_notes: review_notes.clone(),
        }),
        events::EventKind::UpdateNotes {
            application_id,
            notes,
        } => EventKind::UpdateNotes(UpdateNotes {
            application_id: application_id.clone(),
            notes: notes.clone(),
        }),
    };

    ProtoEventEnvelope {
        sequence: event.sequence,
        logical_time: event.logical_time,
        timestamp: event.timestamp.clone(),
        event: Some(ProtoEvent { kind: Some(kind) }),
    }
}

/// Convert a protobuf EventEnvelope back to the kernel's form.
///
/// The wire format does not carry a schema version; the log is schema v1
/// by construction, so decoded events are stamped with the kernel's
/// current SCHEMA_VERSION.
pub fn proto_to_kernel(proto: &ProtoEventEnvelope) -> Result<EventEnvelope, RuntimeError> {
    let kind = proto
        .event
        .as_ref()
        .and_then(|e| e.kind.as_ref())
        .ok_or_else(|| RuntimeError::CorruptFrame("envelope has no event kind".to_string()))?;

    let kind = match kind {
        EventKind::CreateApplication(c) => events::EventKind::CreateApplication {
            application_id: c.application_id.clone(),
            vendor_id: c.vendor_id.clone(),
            market_id: c.market_id.clone(),
            availability: MarketAvailability::from_str(&c.availability)?,
            notes: c.notes.clone(),
        },
        EventKind::TransitionStatus(t) => events::EventKind::TransitionStatus {
            application_id: t.application_id.clone(),
            to: ApplicationStatus::from_str(&t.to)?,
            reviewer: t.reviewer.clone(),
            review_notes: t.review_notes.clone(),
        },
        EventKind::UpdateNotes(u) => events::EventKind::UpdateNotes {
            application_id: u.application_id.clone(),
            notes: u.notes.clone(),
        },
    };

    Ok(EventEnvelope {
        sequence: proto.sequence,
        timestamp: proto.timestamp.clone(),
        logical_time: proto.logical_time,
        schema_version: events::SCHEMA_VERSION,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumfor_application_engine::events::SCHEMA_VERSION;

    #[test]
    fn round_trip_preserves_the_event() {
        let event = EventEnvelope {
            sequence: 7,
            timestamp: "2026-03-01T09:07:00Z".to_string(),
            logical_time: 7,
            schema_version: SCHEMA_VERSION,
            kind: events::EventKind::TransitionStatus {
                application_id: "app-1".to_string(),
                to: ApplicationStatus::UnderReview,
                reviewer: Some("promoter-1".to_string()),
                review_notes: "looks solid".to_string(),
            },
        };
        let proto = kernel_to_proto(&event);
        let back = proto_to_kernel(&proto).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unknown_wire_status_is_rejected() {
        let mut proto = kernel_to_proto(&EventEnvelope {
            sequence: 1,
            timestamp: String::new(),
            logical_time: 1,
            schema_version: SCHEMA_VERSION,
            kind: events::EventKind::TransitionStatus {
                application_id: "app-1".to_string(),
                to: ApplicationStatus::Submitted,
                reviewer: None,
                review_notes: String::new(),
            },
        });
        if let Some(ProtoEvent {
            kind: Some(EventKind::TransitionStatus(ref mut t)),
        }) = proto.event
        {
            t.to = "booked".to_string();
        }
        assert!(matches!(
            proto_to_kernel(&proto),
            Err(RuntimeError::UnknownStatus(_))
        ));
    }
}
