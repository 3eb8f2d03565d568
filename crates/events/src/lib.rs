//! Domain event staging and dispatch.
//!
//! Events produced while handling a command are staged in an [`EventStore`],
//! deduplicated by identity, and released to an [`EventDispatcher`] only when
//! the transaction is committed.

pub mod bus;
pub mod command;
pub mod dispatcher;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod ordering;
pub mod staging;
pub mod store;

pub use bus::Subscription;
pub use command::Command;
pub use dispatcher::{EventDispatcher, FnDispatcher, dispatcher_fn};
pub use envelope::EventEnvelope;
pub use event::DomainEvent;
pub use handler::{CommandHandler, TransactionError, execute_in_transaction, run_in_transaction};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use ordering::{EventOrdering, InsertionOrder, OrderingFn, ordering_fn};
pub use staging::StagedEvents;
pub use store::{EventStore, InMemoryEventStore, SharedEventStore, StateError, StoreConfig};

pub use evstage_core::EventId;
