//! Event dispatch capability (the message bus, seen from the store).
//!
//! The store never knows who subscribes to what. It holds one
//! [`EventDispatcher`] and calls `handle` once per committed event, synchronously,
//! in the committing thread.
//!
//! ## Implementations
//!
//! - [`FnDispatcher`]: in-process direct calls through a closure
//! - [`InMemoryEventBus`](crate::InMemoryEventBus): forwards events to channel subscriptions
//!
//! Anything else (a broker client, a queue producer) only has to implement `handle`.

use std::sync::Arc;

/// Receives committed events one at a time.
///
/// ## Error Handling
///
/// `handle()` may fail with an implementation-defined error. The store does not catch,
/// wrap or retry it: the error ends the commit and is returned to the committer as is.
/// Events handled before the failure stay delivered.
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync` so one dispatcher can back stores on several
/// threads (see [`SharedEventStore`](crate::SharedEventStore)).
pub trait EventDispatcher<E>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, event: E) -> Result<(), Self::Error>;
}

impl<E, D> EventDispatcher<E> for Arc<D>
where
    D: EventDispatcher<E> + ?Sized,
{
    type Error = D::Error;

    fn handle(&self, event: E) -> Result<(), Self::Error> {
        (**self).handle(event)
    }
}

impl<E, D> EventDispatcher<E> for &D
where
    D: EventDispatcher<E> + ?Sized,
{
    type Error = D::Error;

    fn handle(&self, event: E) -> Result<(), Self::Error> {
        (**self).handle(event)
    }
}

/// Closure-backed dispatcher. Build it with [`dispatcher_fn`].
#[derive(Clone)]
pub struct FnDispatcher<F> {
    f: F,
}

impl<F> core::fmt::Debug for FnDispatcher<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnDispatcher").finish_non_exhaustive()
    }
}

/// Dispatch each event by calling `f` directly.
///
/// ```ignore
/// let dispatcher = dispatcher_fn(|event: EventEnvelope<Deposit>| {
///     ledger.apply(event.payload());
///     Ok::<_, LedgerError>(())
/// });
/// ```
pub fn dispatcher_fn<F>(f: F) -> FnDispatcher<F> {
    FnDispatcher { f }
}

impl<E, F, Fail> EventDispatcher<E> for FnDispatcher<F>
where
    F: Fn(E) -> Result<(), Fail> + Send + Sync,
    Fail: core::fmt::Debug + Send + Sync + 'static,
{
    type Error = Fail;

    fn handle(&self, event: E) -> Result<(), Self::Error> {
        (self.f)(event)
    }
}
