/// A request to change state (command abstraction).
///
/// Commands represent **intent**. They are transient and never staged; handling one
/// produces the domain events that are.
///
/// ## Command vs Event
///
/// - **Command**: Intent to do something (e.g., "Open account for alice")
/// - **Event**: Fact that something happened (e.g., "AccountOpened { owner: alice }")
///
/// ## Design Constraints
///
/// Commands must be:
/// - **Debug**: they show up in logs when a handler rejects them
/// - **Send + Sync + 'static**: they may cross thread boundaries (workers, shared stores)
pub trait Command: core::fmt::Debug + Send + Sync + 'static {
    /// Stable command name, used as a tracing span field.
    fn command_name(&self) -> &'static str;
}
