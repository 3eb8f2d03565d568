//! Channel-backed subscriptions for the in-memory bus.
//!
//! A subscription is the receiving end of one channel fed by
//! [`InMemoryEventBus`](crate::InMemoryEventBus). Each subscription gets its own copy of
//! every event the bus handles after the subscription was opened.

use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// A subscription to the events committed through a bus.
///
/// ## Usage Pattern
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let subscription = bus.subscribe();
/// let mut store = InMemoryEventStore::new(bus.clone());
///
/// store.store(event);
/// store.commit()?;
///
/// while let Ok(event) = subscription.try_recv() {
///     project(event);
/// }
/// ```
///
/// ## Message Ordering
///
/// Messages arrive in the order the bus handled them, which for a single store is the
/// commit order.
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: Receiver<E>,
}

impl<E> Subscription<E> {
    pub fn new(receiver: Receiver<E>) -> Self {
        Self { receiver }
    }

    /// Block until the next event is available.
    pub fn recv(&self) -> Result<E, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Result<E, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for an event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued, without blocking.
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }
}
