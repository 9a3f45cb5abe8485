//! Error types for rolink operations.

use crate::entity::EntityKind;
use thiserror::Error;

/// Result type used throughout the rolink crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the rolink layer.
///
/// "Nothing available" is deliberately NOT an error: take-like operations
/// report it through [`RecvResult::RetryLater`] or `Ok(None)`, and a wait
/// that times out reports a non-error outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying transport reported a hard failure.
    /// Carries the transport's diagnostic text verbatim.
    #[error("transport error: {0}")]
    Transport(String),

    /// A node, namespace, topic, or service name failed validation.
    #[error("invalid {kind} name `{name}`: {reason}")]
    InvalidName {
        /// What the name was supposed to denote ("node", "namespace", "topic").
        kind: &'static str,
        /// The offending name.
        name: String,
        /// Which rule it broke.
        reason: &'static str,
    },

    /// `shutdown` was called on a context that is already shut down.
    #[error("context has already been shut down")]
    AlreadyShutdown,

    /// A wait-set category has no free slot left.
    /// Capacities are fixed at construction; this is a caller error.
    #[error("wait set has no free {0} slot")]
    WaitSetFull(EntityKind),

    /// `wait` was called on a wait set with no populated slot.
    #[error("wait set contains no entities")]
    WaitSetEmpty,

    /// The entity kind cannot be placed in a wait set.
    #[error("{0} entities cannot be waited on")]
    UnsupportedWaitKind(EntityKind),

    /// A category name did not parse to a known [`EntityKind`].
    /// Distinct from transport errors by design.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// The process received a termination signal while waiting.
    #[error("interrupted by signal")]
    Signaled,

    /// A message failed to convert to or from its wire form.
    #[error("type conversion failed: {0}")]
    Conversion(String),
}

/// Tri-state outcome of a non-blocking take operation.
///
/// `RetryLater` is a first-class, expected outcome: it is returned when the
/// transport reports "no data available", for example after a wait marked an
/// entity ready but a competing consumer drained it first.
#[derive(Debug)]
#[must_use]
pub enum RecvResult<T> {
    /// Data was taken.
    Ok(T),
    /// Nothing available right now; wait again and retry.
    RetryLater,
    /// A hard error occurred.
    Err(Error),
}

impl<T> RecvResult<T> {
    /// Returns the taken value, if any, discarding the error case.
    pub fn ok(self) -> Option<T> {
        match self {
            RecvResult::Ok(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_diagnostic() {
        let err = Error::Transport("queue full for '/scan'".into());
        assert_eq!(err.to_string(), "transport error: queue full for '/scan'");
    }

    #[test]
    fn wait_set_full_names_category() {
        let err = Error::WaitSetFull(EntityKind::Subscription);
        assert_eq!(err.to_string(), "wait set has no free subscription slot");
    }
}
