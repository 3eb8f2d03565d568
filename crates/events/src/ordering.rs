//! Ordering hook applied to a transaction's events right before dispatch.
//!
//! The default policy is [`InsertionOrder`], which leaves the staged order untouched.
//! Other policies (causal, timestamp, priority) plug in without changing the store.

/// Decides the dispatch order of a committed batch.
///
/// Implementations receive the events in staging order and must return the same
/// events. Dropping or duplicating events is outside the contract.
pub trait EventOrdering<E>: Send + Sync {
    fn order(&self, events: Vec<E>) -> Vec<E>;
}

/// Dispatch in staging order (identity).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertionOrder;

impl<E> EventOrdering<E> for InsertionOrder {
    fn order(&self, events: Vec<E>) -> Vec<E> {
        events
    }
}

/// Closure-backed ordering policy. Build it with [`ordering_fn`].
#[derive(Clone)]
pub struct OrderingFn<F> {
    f: F,
}

impl<F> core::fmt::Debug for OrderingFn<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderingFn").finish_non_exhaustive()
    }
}

/// Order each committed batch with `f`.
///
/// ```ignore
/// let by_time = ordering_fn(|mut events: Vec<EventEnvelope<Payload>>| {
///     events.sort_by_key(|e| e.occurred_at());
///     events
/// });
/// ```
pub fn ordering_fn<F>(f: F) -> OrderingFn<F> {
    OrderingFn { f }
}

impl<E, F> EventOrdering<E> for OrderingFn<F>
where
    F: Fn(Vec<E>) -> Vec<E> + Send + Sync,
{
    fn order(&self, events: Vec<E>) -> Vec<E> {
        (self.f)(events)
    }
}
