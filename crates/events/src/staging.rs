//! Transaction-scoped staging state: the pending list plus the seen-set.

use std::collections::HashSet;

use evstage_core::EventId;

use crate::DomainEvent;
use crate::store::StateError;

/// Events pending commit, in staging order, deduplicated by identity.
///
/// Invariants:
/// - no `EventId` appears twice in `events`
/// - `seen` holds exactly the ids of `events`
/// - outside a transaction both collections are empty
///
/// The configured capacity is kept across transactions: `take` hands out the staged
/// list and replaces it with a pre-sized one, and both `take` and `clear` give back
/// memory a single oversized transaction grew the collections to.
#[derive(Debug)]
pub struct StagedEvents<E> {
    events: Vec<E>,
    seen: HashSet<EventId>,
    capacity: usize,
}

/// Collections are only shrunk once they exceed this many times the configured capacity.
const SHRINK_FACTOR: usize = 4;

/// Smallest capacity worth shrinking towards.
const SHRINK_FLOOR: usize = 64;

impl<E> Default for StagedEvents<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            seen: HashSet::new(),
            capacity: 0,
        }
    }
}

impl<E: DomainEvent> StagedEvents<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `event` unless its identity was already staged.
    ///
    /// Returns `false` for a duplicate (idempotent re-staging).
    pub fn stage(&mut self, event: E) -> bool {
        if !self.seen.insert(event.event_id()) {
            return false;
        }
        self.events.push(event);
        true
    }

    /// Fails while events from an unfinished transaction are still pending.
    pub fn ensure_idle(&self) -> Result<(), StateError> {
        if self.events.is_empty() {
            Ok(())
        } else {
            Err(StateError::PendingEvents {
                pending: self.events.len(),
            })
        }
    }

    /// Pre-size both collections for `capacity` events per transaction, now and
    /// after every `take`.
    pub fn presize(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.events.reserve(capacity.saturating_sub(self.events.len()));
        self.seen.reserve(capacity.saturating_sub(self.seen.len()));
    }

    /// Configured per-transaction capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard everything staged.
    pub fn clear(&mut self) {
        self.events.clear();
        self.seen.clear();
        self.shrink_oversized();
    }

    /// Capture the staged events and leave the state empty.
    pub fn take(&mut self) -> Vec<E> {
        self.seen.clear();
        let events = std::mem::replace(&mut self.events, Vec::with_capacity(self.capacity));
        self.shrink_oversized();
        events
    }

    fn shrink_oversized(&mut self) {
        let limit = self.capacity.max(SHRINK_FLOOR).saturating_mul(SHRINK_FACTOR);
        if self.events.capacity() > limit {
            self.events.shrink_to(self.capacity);
        }
        if self.seen.capacity() > limit {
            self.seen.shrink_to(self.capacity);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, event_id: EventId) -> bool {
        self.seen.contains(&event_id)
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.events.iter()
    }
}
