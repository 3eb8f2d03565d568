use std::sync::{Mutex, MutexGuard, PoisonError};

use evstage_core::EventId;

use crate::ordering::{EventOrdering, InsertionOrder};
use crate::staging::StagedEvents;
use crate::{DomainEvent, EventDispatcher};

use super::dispatch_batch;
use super::r#trait::{EventStore, StateError, StoreConfig};

/// Mutex-guarded staging store for callers on several threads.
///
/// Every operation takes `&self` and serializes on one lock. The lock only guards the
/// staging state: `commit` captures and clears the staged events, releases the lock, and
/// then dispatches. Dispatchers may therefore stage follow-up events into the same store
/// while a commit is running; those belong to the next transaction.
///
/// A poisoned lock is recovered. The staging state is cleared before any dispatcher code
/// runs, so a panic during dispatch cannot leave it half-updated.
#[derive(Debug)]
pub struct SharedEventStore<E, D, O = InsertionOrder> {
    staged: Mutex<StagedEvents<E>>,
    dispatcher: D,
    ordering: O,
    config: StoreConfig,
}

impl<E, D> SharedEventStore<E, D>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
{
    pub fn new(dispatcher: D) -> Self {
        Self::with_ordering(dispatcher, InsertionOrder)
    }
}

impl<E, D, O> SharedEventStore<E, D, O>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
    O: EventOrdering<E>,
{
    pub fn with_ordering(dispatcher: D, ordering: O) -> Self {
        Self {
            staged: Mutex::new(StagedEvents::new()),
            dispatcher,
            ordering,
            config: StoreConfig::default(),
        }
    }

    pub fn with_config(self, config: StoreConfig) -> Self {
        let mut staged = self.staged.into_inner().unwrap_or_else(PoisonError::into_inner);
        staged.presize(config.capacity);

        Self {
            staged: Mutex::new(staged),
            dispatcher: self.dispatcher,
            ordering: self.ordering,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn lock(&self) -> MutexGuard<'_, StagedEvents<E>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage `event` unless an event with the same identity is already staged.
    pub fn store(&self, event: E) {
        let event_id = event.event_id();
        let event_type = event.event_type();

        if self.lock().stage(event) {
            tracing::debug!(store = %self.config.name, %event_id, event_type, "staged event");
        } else {
            tracing::debug!(store = %self.config.name, %event_id, event_type, "duplicate event ignored");
        }
    }

    pub fn begin_transaction(&self) -> Result<(), StateError> {
        let mut staged = self.lock();
        if let Err(err) = staged.ensure_idle() {
            drop(staged);
            tracing::warn!(store = %self.config.name, error = %err, "begin_transaction refused");
            return Err(err);
        }

        staged.clear();
        Ok(())
    }

    pub fn rollback(&self) {
        let discarded = {
            let mut staged = self.lock();
            let discarded = staged.len();
            staged.clear();
            discarded
        };
        tracing::debug!(store = %self.config.name, discarded, "rolled back transaction");
    }

    pub fn commit(&self) -> Result<(), D::Error> {
        let events = self.lock().take();
        let events = self.ordering.order(events);
        tracing::debug!(store = %self.config.name, count = events.len(), "committing transaction");

        dispatch_batch(&self.config.name, &self.dispatcher, events)
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Identities of the currently staged events, in staging order.
    pub fn staged_ids(&self) -> Vec<EventId> {
        self.lock().iter().map(|event| event.event_id()).collect()
    }
}

impl<E, D, O> EventStore<E> for SharedEventStore<E, D, O>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
    O: EventOrdering<E>,
{
    type DispatchError = D::Error;

    fn store(&mut self, event: E) {
        SharedEventStore::store(&*self, event)
    }

    fn begin_transaction(&mut self) -> Result<(), StateError> {
        SharedEventStore::begin_transaction(&*self)
    }

    fn rollback(&mut self) {
        SharedEventStore::rollback(&*self)
    }

    fn commit(&mut self) -> Result<(), Self::DispatchError> {
        SharedEventStore::commit(&*self)
    }

    fn pending(&self) -> usize {
        SharedEventStore::pending(self)
    }
}

impl<E, D, O> EventStore<E> for &SharedEventStore<E, D, O>
where
    E: DomainEvent,
    D: EventDispatcher<E>,
    O: EventOrdering<E>,
{
    type DispatchError = D::Error;

    fn store(&mut self, event: E) {
        SharedEventStore::store(*self, event)
    }

    fn begin_transaction(&mut self) -> Result<(), StateError> {
        SharedEventStore::begin_transaction(*self)
    }

    fn rollback(&mut self) {
        SharedEventStore::rollback(*self)
    }

    fn commit(&mut self) -> Result<(), Self::DispatchError> {
        SharedEventStore::commit(*self)
    }

    fn pending(&self) -> usize {
        SharedEventStore::pending(*self)
    }
}
