//! Command handling inside a unit of work.
//!
//! A command is handled between `begin_transaction` and `commit`: every event the
//! handler produces is staged, and the events only reach the dispatcher once the
//! handler has succeeded.
//!
//! ```text
//! begin_transaction ─► handle(command) ─► store(e) for each event ─► commit
//!                             │
//!                             └─ Err ─► rollback
//! ```

use thiserror::Error;

use crate::store::{EventStore, StateError};
use crate::{Command, DomainEvent};

/// Handles a command and emits events (command handler abstraction).
///
/// The handler decides; it does not dispatch. Errors are domain-specific, so the error
/// type is associated.
pub trait CommandHandler {
    type Cmd: Command;
    type Ev: DomainEvent;
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, command: &Self::Cmd) -> Result<Vec<Self::Ev>, Self::Error>;
}

/// Failure of a unit of work.
#[derive(Debug, Error)]
pub enum TransactionError<H, D> {
    /// The store still held events from an unfinished transaction.
    #[error(transparent)]
    State(#[from] StateError),

    /// The handler rejected the command. Nothing was dispatched.
    #[error("command rejected: {0:?}")]
    Handler(H),

    /// The dispatcher failed during commit. Earlier events of the batch were delivered.
    #[error("event dispatch failed: {0:?}")]
    Dispatch(D),
}

/// Handle `command` in its own transaction on `store`.
///
/// 1. **Begin**: fails with [`TransactionError::State`] if the store is not idle
/// 2. **Decide**: `handler.handle(command)`; on error the transaction is rolled back
/// 3. **Stage**: every produced event is stored (duplicates collapse)
/// 4. **Commit**: events are dispatched in order
pub fn execute_in_transaction<S, H>(
    store: &mut S,
    handler: &H,
    command: &H::Cmd,
) -> Result<(), TransactionError<H::Error, S::DispatchError>>
where
    H: CommandHandler,
    S: EventStore<H::Ev>,
{
    let span = tracing::debug_span!("command", command = command.command_name());
    let _enter = span.enter();

    run_in_transaction(store, |store: &mut S| -> Result<(), H::Error> {
        let events = handler.handle(command)?;
        for event in events {
            store.store(event);
        }
        Ok(())
    })
}

/// Run `f` in its own transaction on `store`.
///
/// `f` stages events through the store it is given. If it returns `Err`, everything it
/// staged is rolled back; otherwise the transaction is committed and `f`'s value is
/// returned.
pub fn run_in_transaction<S, E, T, Fail, F>(
    store: &mut S,
    f: F,
) -> Result<T, TransactionError<Fail, S::DispatchError>>
where
    E: DomainEvent,
    S: EventStore<E>,
    Fail: core::fmt::Debug,
    F: FnOnce(&mut S) -> Result<T, Fail>,
{
    store.begin_transaction()?;

    let value = match f(store) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = ?err, discarded = store.pending(), "unit of work failed; rolling back");
            store.rollback();
            return Err(TransactionError::Handler(err));
        }
    };

    store.commit().map_err(TransactionError::Dispatch)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{EventEnvelope, InMemoryEventStore, dispatcher_fn};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Ledger {
        Opened { owner: String },
        Credited { amount: u64 },
    }

    type Event = EventEnvelope<Ledger>;

    #[derive(Debug)]
    struct OpenAccount {
        owner: String,
        initial_credit: u64,
    }

    impl Command for OpenAccount {
        fn command_name(&self) -> &'static str {
            "open_account"
        }
    }

    struct OpenAccountHandler;

    impl CommandHandler for OpenAccountHandler {
        type Cmd = OpenAccount;
        type Ev = Event;
        type Error = String;

        fn handle(&self, command: &OpenAccount) -> Result<Vec<Event>, String> {
            if command.owner.is_empty() {
                return Err("owner must not be empty".to_string());
            }
            let mut events = vec![EventEnvelope::new(
                "account.opened",
                Ledger::Opened {
                    owner: command.owner.clone(),
                },
            )];
            if command.initial_credit > 0 {
                events.push(EventEnvelope::new(
                    "account.credited",
                    Ledger::Credited {
                        amount: command.initial_credit,
                    },
                ));
            }
            Ok(events)
        }
    }

    fn recording_store(
        log: &Mutex<Vec<Ledger>>,
    ) -> InMemoryEventStore<Event, impl crate::EventDispatcher<Event, Error = String> + '_> {
        InMemoryEventStore::new(dispatcher_fn(move |e: Event| {
            log.lock().unwrap().push(e.into_payload());
            Ok::<_, String>(())
        }))
    }

    #[test]
    fn successful_command_dispatches_its_events() {
        let log = Mutex::new(Vec::new());
        let mut store = recording_store(&log);

        execute_in_transaction(
            &mut store,
            &OpenAccountHandler,
            &OpenAccount {
                owner: "alice".to_string(),
                initial_credit: 50,
            },
        )
        .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Ledger::Opened {
                    owner: "alice".to_string()
                },
                Ledger::Credited { amount: 50 },
            ]
        );
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn rejected_command_dispatches_nothing() {
        let log = Mutex::new(Vec::new());
        let mut store = recording_store(&log);

        let err = execute_in_transaction(
            &mut store,
            &OpenAccountHandler,
            &OpenAccount {
                owner: String::new(),
                initial_credit: 0,
            },
        )
        .unwrap_err();

        assert!(matches!(err, TransactionError::Handler(ref msg) if msg == "owner must not be empty"));
        assert!(log.lock().unwrap().is_empty());
        assert!(store.begin_transaction().is_ok());
    }

    #[test]
    fn unclosed_transaction_is_reported() {
        let log = Mutex::new(Vec::new());
        let mut store = recording_store(&log);
        store.store(EventEnvelope::new("stray", Ledger::Credited { amount: 1 }));

        let err = execute_in_transaction(
            &mut store,
            &OpenAccountHandler,
            &OpenAccount {
                owner: "bob".to_string(),
                initial_credit: 0,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            TransactionError::State(StateError::PendingEvents { pending: 1 })
        ));
        assert_eq!(store.pending(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn run_in_transaction_rolls_back_on_error() {
        let log = Mutex::new(Vec::new());
        let mut store = recording_store(&log);

        let result: Result<(), _> = run_in_transaction(&mut store, |store| {
            store.store(EventEnvelope::new("account.credited", Ledger::Credited { amount: 5 }));
            Err("insufficient funds")
        });

        assert!(matches!(result, Err(TransactionError::Handler("insufficient funds"))));
        assert_eq!(store.pending(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn run_in_transaction_returns_closure_value() {
        let log = Mutex::new(Vec::new());
        let mut store = recording_store(&log);

        let staged = run_in_transaction(&mut store, |store| {
            store.store(EventEnvelope::new("account.credited", Ledger::Credited { amount: 5 }));
            Ok::<_, String>(store.pending())
        })
        .unwrap();

        assert_eq!(staged, 1);
        assert_eq!(*log.lock().unwrap(), vec![Ledger::Credited { amount: 5 }]);
    }

    #[test]
    fn dispatch_error_is_surfaced() {
        let mut store = InMemoryEventStore::new(dispatcher_fn(|_: Event| Err::<(), _>("bus down")));

        let err = execute_in_transaction(
            &mut store,
            &OpenAccountHandler,
            &OpenAccount {
                owner: "carol".to_string(),
                initial_credit: 0,
            },
        )
        .unwrap_err();

        assert!(matches!(err, TransactionError::Dispatch("bus down")));
        assert_eq!(err.to_string(), "event dispatch failed: \"bus down\"");
    }
}
