//! Event staging store boundary.
//!
//! This module defines the transaction protocol for staging domain events and
//! releasing them to a dispatcher, without making any storage assumptions.
//! Both implementations here are in-memory and non-durable.

pub mod in_memory;
pub mod shared;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, StateError, StoreConfig};
pub use shared::SharedEventStore;

use crate::{DomainEvent, EventDispatcher};

/// Hand a committed batch to `dispatcher`, one event at a time, in order.
///
/// Stops at the first failure and returns that error unchanged. Events before the
/// failure stay delivered; events after it are dropped.
pub(crate) fn dispatch_batch<E, D>(store: &str, dispatcher: &D, events: Vec<E>) -> Result<(), D::Error>
where
    E: DomainEvent,
    D: EventDispatcher<E> + ?Sized,
{
    let total = events.len();

    for (position, event) in events.into_iter().enumerate() {
        let event_id = event.event_id();
        let event_type = event.event_type();
        tracing::trace!(store, %event_id, event_type, position, "dispatching event");

        if let Err(err) = dispatcher.handle(event) {
            tracing::warn!(
                store,
                %event_id,
                event_type,
                position,
                undelivered = total - position - 1,
                error = ?err,
                "event dispatch failed; remaining events dropped"
            );
            return Err(err);
        }
    }

    Ok(())
}
