//! Entity kinds and transport handle types.
//!
//! Transports hand out stable integer ids instead of raw addresses; the
//! client layer wraps them in the newtypes below so a node handle can never
//! be confused with an entity handle.

use crate::error::Error;
use std::{fmt, str::FromStr};

/// Kind of a communication entity, matched exhaustively everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// A node; owns the other entity kinds.
    Node,
    /// Topic publisher.
    Publisher,
    /// Topic subscription.
    Subscription,
    /// Service client.
    ServiceClient,
    /// Service server.
    ServiceServer,
    /// Manually triggerable wakeup condition.
    GuardCondition,
    /// Timer slot; reserved in wait sets, driven by the selector.
    Timer,
}

impl EntityKind {
    /// Canonical lower-case category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Publisher => "publisher",
            EntityKind::Subscription => "subscription",
            EntityKind::ServiceClient => "client",
            EntityKind::ServiceServer => "service",
            EntityKind::GuardCondition => "guard_condition",
            EntityKind::Timer => "timer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "node" => Ok(EntityKind::Node),
            "publisher" => Ok(EntityKind::Publisher),
            "subscription" => Ok(EntityKind::Subscription),
            "client" => Ok(EntityKind::ServiceClient),
            "service" => Ok(EntityKind::ServiceServer),
            "guard_condition" => Ok(EntityKind::GuardCondition),
            "timer" => Ok(EntityKind::Timer),
            other => Err(Error::UnknownEntityKind(other.to_string())),
        }
    }
}

/// Stable transport-allocated id of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawNode(pub u64);

/// Stable transport-allocated id of a non-node entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawEntity(pub u64);

/// Non-owning reference to an entity as stored in a wait-set slot.
///
/// The caller must guarantee the referenced entity outlives every wait that
/// may observe this handle; the wait set itself takes no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitHandle {
    /// Category the handle belongs to.
    pub kind: EntityKind,
    /// Transport id of the entity.
    pub raw: RawEntity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            EntityKind::Node,
            EntityKind::Publisher,
            EntityKind::Subscription,
            EntityKind::ServiceClient,
            EntityKind::ServiceServer,
            EntityKind::GuardCondition,
            EntityKind::Timer,
        ] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_a_distinct_error() {
        let err = "waitable".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownEntityKind(s) if s == "waitable"));
    }
}
