//! Support types for callback-driven selectors.

/// Outcome of a selector callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    /// Callback executed successfully, keep it registered.
    Ok,
    /// Remove this callback from the selector.
    Remove,
}

/// A registered event source paired with its callback.
///
/// `event` keeps the underlying entity alive for as long as the registration
/// exists, so a wait set populated from these handlers never references a
/// finalized entity.
pub struct ConditionHandler<E> {
    /// Owned reference to the event source.
    pub event: E,
    /// Callback invoked when the source is ready. `None` means the
    /// registration only exists to wake the wait loop.
    pub handler: Option<Box<dyn FnMut() -> CallbackResult>>,
    /// Remove the registration after the first ready cycle.
    pub is_once: bool,
}
