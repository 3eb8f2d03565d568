use chrono::{DateTime, Utc};
use serde::Serialize;

use evstage_core::EventId;

use crate::DomainEvent;

/// Envelope giving an arbitrary payload an event identity.
///
/// This is the simplest way to stage plain data: the payload stays opaque and
/// the envelope carries what the store needs.
///
/// Notes:
/// - **Identity**: `event_id` is minted once, in `new`. Cloning the envelope keeps it,
///   so a clone is the same occurrence and is deduplicated on re-staging.
/// - **Business time**: `occurred_at` records when the event happened, not when it
///   was dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventEnvelope<P> {
    event_id: EventId,
    event_type: &'static str,
    occurred_at: DateTime<Utc>,

    payload: P,
}

impl<P> EventEnvelope<P> {
    /// Wrap `payload` as a new occurrence (fresh id, current time).
    pub fn new(event_type: &'static str, payload: P) -> Self {
        Self::with_id(EventId::new(), event_type, Utc::now(), payload)
    }

    /// Deterministic constructor, for tests and replays.
    pub fn with_id(
        event_id: EventId,
        event_type: &'static str,
        occurred_at: DateTime<Utc>,
        payload: P,
    ) -> Self {
        Self {
            event_id,
            event_type,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Transform the payload while keeping the identity of the occurrence.
    pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> EventEnvelope<Q> {
        EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            occurred_at: self.occurred_at,
            payload: f(self.payload),
        }
    }
}

impl<P> DomainEvent for EventEnvelope<P>
where
    P: core::fmt::Debug + Send + Sync + 'static,
{
    fn event_id(&self) -> EventId {
        self.event_id
    }

    fn event_type(&self) -> &'static str {
        self.event_type
    }
}
