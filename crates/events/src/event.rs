use std::sync::Arc;

use evstage_core::EventId;

/// A domain event as seen by the staging store.
///
/// Events are facts: once produced they are never mutated. The store only
/// needs two things from them:
/// - a stable **identity** (`event_id`) to recognise re-staging of the same occurrence
/// - a stable **type name** (`event_type`) for diagnostics
///
/// Identity is deliberately separate from `PartialEq`. Two events with equal
/// payloads but different ids are distinct occurrences.
pub trait DomainEvent: core::fmt::Debug + Send + Sync + 'static {
    /// Identity of this occurrence.
    fn event_id(&self) -> EventId;

    /// Stable event name/type identifier (e.g. "account.opened").
    fn event_type(&self) -> &'static str;
}

impl<E> DomainEvent for Arc<E>
where
    E: DomainEvent + ?Sized,
{
    fn event_id(&self) -> EventId {
        (**self).event_id()
    }

    fn event_type(&self) -> &'static str {
        (**self).event_type()
    }
}

impl<E> DomainEvent for Box<E>
where
    E: DomainEvent + ?Sized,
{
    fn event_id(&self) -> EventId {
        (**self).event_id()
    }

    fn event_type(&self) -> &'static str {
        (**self).event_type()
    }
}
