//! Quality of Service policies and profiles.
//!
//! The profile is an opaque configuration record from the point of view of
//! the client layer: it is handed to the transport at entity creation and
//! never interpreted afterwards.

/// QoS history policy - how samples are stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Only store up to `depth` samples, dropping the oldest once exceeded.
    KeepLast,
    /// Store all samples, subject to transport resource limits.
    KeepAll,
}

/// QoS reliability policy - how messages are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityPolicy {
    /// Guarantee that samples are delivered, may retry multiple times.
    Reliable,
    /// Attempt to deliver samples, but some may be lost.
    BestEffort,
}

/// QoS durability policy - how samples persist for late joiners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityPolicy {
    /// The publisher persists samples for late-joining subscriptions.
    TransientLocal,
    /// Samples are not persistent.
    Volatile,
}

/// A QoS profile handed to the transport at entity creation.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Sample storage policy.
    pub history: HistoryPolicy,
    /// Size of the message queue when `history` is `KeepLast`.
    pub depth: usize,
    /// Delivery policy.
    pub reliability: ReliabilityPolicy,
    /// Persistence policy.
    pub durability: DurabilityPolicy,
}

impl Default for Profile {
    /// Default topic profile: keep last 10, reliable, volatile.
    fn default() -> Self {
        Self {
            history: HistoryPolicy::KeepLast,
            depth: 10,
            reliability: ReliabilityPolicy::Reliable,
            durability: DurabilityPolicy::Volatile,
        }
    }
}

impl Profile {
    /// Services profile: keep last 10, reliable, volatile.
    pub const fn services_default() -> Self {
        Self {
            history: HistoryPolicy::KeepLast,
            depth: 10,
            reliability: ReliabilityPolicy::Reliable,
            durability: DurabilityPolicy::Volatile,
        }
    }

    /// Sensor data profile: keep last 5, best effort, volatile.
    pub const fn sensor_data() -> Self {
        Self {
            history: HistoryPolicy::KeepLast,
            depth: 5,
            reliability: ReliabilityPolicy::BestEffort,
            durability: DurabilityPolicy::Volatile,
        }
    }
}
