use crate::ordering::{EventOrdering, InsertionOrder};
use crate::staging::StagedEvents;
use crate::{DomainEvent, EventDispatcher};

use super::dispatch_batch;
use super::r#trait::{EventStore, StateError, StoreConfig};

/// In-memory staging store.
///
/// Holds staged events for one unit of work at a time and hands them to its
/// dispatcher on `commit`. Nothing outlives a transaction; there is no persistence.
///
/// Intended to be owned by a single unit of work (one per request/command, or one
/// long-lived instance reused sequentially). For shared access across threads use
/// [`SharedEventStore`](super::SharedEventStore).
#[derive(Debug)]
pub struct InMemoryEventStore<E, D, O = InsertionOrder> {
    staged: StagedEvents<E>,
    dispatcher: D,
    ordering: O,
    config: StoreConfig,
}

impl<E, D> InMemoryEventStore<E, D>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
{
    pub fn new(dispatcher: D) -> Self {
        Self::with_ordering(dispatcher, InsertionOrder)
    }
}

impl<E, D, O> InMemoryEventStore<E, D, O>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
    O: EventOrdering<E>,
{
    pub fn with_ordering(dispatcher: D, ordering: O) -> Self {
        Self {
            staged: StagedEvents::new(),
            dispatcher,
            ordering,
            config: StoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.staged.presize(config.capacity);
        self.config = config;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }

    /// Events staged in the current transaction, in staging order.
    pub fn staged(&self) -> &[E] {
        self.staged.as_slice()
    }
}

impl<E, D, O> EventStore<E> for InMemoryEventStore<E, D, O>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
    O: EventOrdering<E>,
{
    type DispatchError = D::Error;

    fn store(&mut self, event: E) {
        let event_id = event.event_id();
        let event_type = event.event_type();

        if self.staged.stage(event) {
            tracing::debug!(store = %self.config.name, %event_id, event_type, "staged event");
        } else {
            tracing::debug!(store = %self.config.name, %event_id, event_type, "duplicate event ignored");
        }
    }

    fn begin_transaction(&mut self) -> Result<(), StateError> {
        if let Err(err) = self.staged.ensure_idle() {
            tracing::warn!(store = %self.config.name, error = %err, "begin_transaction refused");
            return Err(err);
        }

        self.staged.clear();
        Ok(())
    }

    fn rollback(&mut self) {
        let discarded = self.staged.len();
        self.staged.clear();
        tracing::debug!(store = %self.config.name, discarded, "rolled back transaction");
    }

    fn commit(&mut self) -> Result<(), Self::DispatchError> {
        // Capture and reset before dispatch: a failing dispatcher cannot leave events behind.
        let events = self.ordering.order(self.staged.take());
        tracing::debug!(store = %self.config.name, count = events.len(), "committing transaction");

        dispatch_batch(&self.config.name, &self.dispatcher, events)
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use evstage_core::EventId;

    use super::*;
    use crate::ordering::ordering_fn;
    use crate::{EventEnvelope, dispatcher_fn};

    type Event = EventEnvelope<&'static str>;

    /// Records what it handles; fails on events whose payload is `"poison"`.
    #[derive(Debug, Default)]
    struct Recorder {
        handled: Mutex<Vec<EventId>>,
    }

    impl Recorder {
        fn handled(&self) -> Vec<EventId> {
            self.handled.lock().unwrap().clone()
        }
    }

    impl EventDispatcher<Event> for Recorder {
        type Error = String;

        fn handle(&self, event: Event) -> Result<(), Self::Error> {
            if *event.payload() == "poison" {
                return Err(format!("cannot handle {}", event.event_id()));
            }
            self.handled.lock().unwrap().push(event.event_id());
            Ok(())
        }
    }

    fn event(payload: &'static str) -> Event {
        EventEnvelope::new("test.event", payload)
    }

    #[test]
    fn duplicate_identity_is_dispatched_once() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        let a = event("a");
        let b = event("b");

        store.store(a.clone());
        store.store(b.clone());
        store.store(a.clone());
        store.commit().unwrap();

        assert_eq!(store.dispatcher().handled(), vec![a.event_id(), b.event_id()]);
    }

    #[test]
    fn empty_commit_dispatches_nothing() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        store.commit().unwrap();
        assert!(store.dispatcher().handled().is_empty());
    }

    #[test]
    fn rollback_discards_staged_events() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        store.store(event("a"));
        store.store(event("b"));

        store.rollback();
        store.commit().unwrap();

        assert!(store.dispatcher().handled().is_empty());
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn begin_transaction_refuses_while_events_pending() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        let a = event("a");
        store.store(a.clone());

        let err = store.begin_transaction().unwrap_err();

        assert_eq!(err, StateError::PendingEvents { pending: 1 });
        assert_eq!(store.staged(), &[a]);
    }

    #[test]
    fn begin_transaction_twice_when_idle() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        assert!(store.begin_transaction().is_ok());
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn begin_transaction_succeeds_after_commit_and_rollback() {
        let mut store = InMemoryEventStore::new(Recorder::default());

        store.store(event("a"));
        store.commit().unwrap();
        assert!(store.begin_transaction().is_ok());

        store.store(event("b"));
        store.rollback();
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn committed_event_can_be_staged_again_in_next_transaction() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        let a = event("a");

        store.store(a.clone());
        store.commit().unwrap();
        store.store(a.clone());
        store.commit().unwrap();

        assert_eq!(store.dispatcher().handled(), vec![a.event_id(), a.event_id()]);
    }

    #[test]
    fn dispatch_failure_stops_batch_and_leaves_store_idle() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        let a = event("a");
        let poison = event("poison");
        let c = event("c");

        store.store(a.clone());
        store.store(poison.clone());
        store.store(c);

        let err = store.commit().unwrap_err();

        assert_eq!(err, format!("cannot handle {}", poison.event_id()));
        assert_eq!(store.dispatcher().handled(), vec![a.event_id()]);
        assert_eq!(store.pending(), 0);
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn ordering_hook_decides_dispatch_order() {
        let reversed = ordering_fn(|mut events: Vec<Event>| {
            events.reverse();
            events
        });
        let mut store = InMemoryEventStore::with_ordering(Recorder::default(), reversed);
        let a = event("a");
        let b = event("b");

        store.store(a.clone());
        store.store(b.clone());
        store.commit().unwrap();

        assert_eq!(store.dispatcher().handled(), vec![b.event_id(), a.event_id()]);
    }

    #[test]
    fn closure_dispatcher_and_config() {
        let delivered = Mutex::new(Vec::new());
        let dispatcher = dispatcher_fn(|e: Event| {
            delivered.lock().unwrap().push(*e.payload());
            Ok::<_, String>(())
        });
        let mut store = InMemoryEventStore::new(dispatcher)
            .with_config(StoreConfig::default().with_name("accounts").with_capacity(8));

        store.store(event("opened"));
        store.store(event("credited"));
        store.commit().unwrap();

        assert_eq!(store.config().name, "accounts");
        assert_eq!(*delivered.lock().unwrap(), vec!["opened", "credited"]);
    }

    #[test]
    fn into_dispatcher_returns_the_dispatcher_with_its_state() {
        let mut store = InMemoryEventStore::new(Recorder::default());
        let a = event("a");
        store.store(a.clone());
        store.commit().unwrap();

        let recorder = store.into_dispatcher();

        assert_eq!(recorder.handled(), vec![a.event_id()]);
    }
}
