use thiserror::Error;

use crate::DomainEvent;

/// Transaction protocol misuse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `begin_transaction` was called while a previous transaction still had staged events.
    #[error("there are still {pending} events on the stack, cannot start a new transaction; commit first")]
    PendingEvents { pending: usize },
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name for logging
    pub name: String,
    /// Expected number of events per transaction (pre-sizes the staging collections)
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "event-store".to_string(),
            capacity: 0,
        }
    }
}

impl StoreConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Transaction-scoped staging of domain events.
///
/// The `EventStore` sits between a command handler (producer) and an
/// [`EventDispatcher`](crate::EventDispatcher). Events are buffered while a unit of work
/// runs and only reach the dispatcher when the transaction is committed.
///
/// ## Transaction Protocol
///
/// ```text
/// begin_transaction()            (optional; guards against unclosed transactions)
///   ↓
/// store(e1), store(e2), ...      (staged, deduplicated by event identity)
///   ↓
/// commit()  → dispatch e1, e2, ... in order, then Idle
/// rollback() → discard, then Idle
/// ```
///
/// ## Guarantees
///
/// - **Idempotent staging**: storing an event whose identity is already staged is a no-op
/// - **Order**: events are dispatched in staging order, subject to the store's ordering hook
/// - **Clean close**: after `commit` or `rollback` nothing is staged, whatever the
///   dispatch outcome
///
/// ## Partial Failure
///
/// `commit` clears the store before dispatching. If the dispatcher fails on event *k*,
/// events before *k* are delivered, events after *k* are not, and none are retained for
/// replay. Callers needing replay-after-failure need a durable implementation of this
/// trait.
pub trait EventStore<E: DomainEvent> {
    type DispatchError: core::fmt::Debug + Send + Sync + 'static;

    /// Stage `event` unless an event with the same identity is already staged.
    fn store(&mut self, event: E);

    /// Mark the start of a transaction.
    ///
    /// Fails with [`StateError::PendingEvents`] (leaving the staged events untouched)
    /// if the previous transaction was never committed or rolled back.
    fn begin_transaction(&mut self) -> Result<(), StateError>;

    /// Discard all staged events. Nothing is dispatched.
    fn rollback(&mut self);

    /// Dispatch all staged events, in order, and return to the idle state.
    fn commit(&mut self) -> Result<(), Self::DispatchError>;

    /// Number of events currently staged (zero when idle).
    fn pending(&self) -> usize;
}

impl<E, S> EventStore<E> for &mut S
where
    E: DomainEvent,
    S: EventStore<E> + ?Sized,
{
    type DispatchError = S::DispatchError;

    fn store(&mut self, event: E) {
        (**self).store(event)
    }

    fn begin_transaction(&mut self) -> Result<(), StateError> {
        (**self).begin_transaction()
    }

    fn rollback(&mut self) {
        (**self).rollback()
    }

    fn commit(&mut self) -> Result<(), Self::DispatchError> {
        (**self).commit()
    }

    fn pending(&self) -> usize {
        (**self).pending()
    }
}
