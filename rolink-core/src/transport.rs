//! The abstract transport boundary.
//!
//! The client layer orchestrates entity lifecycle and readiness on top of an
//! underlying pub/sub + RPC library that already implements delivery, QoS,
//! and discovery. This trait names exactly the capabilities the client layer
//! consumes; `rolink-mem` provides an in-process implementation.
//!
//! Every operation returns promptly except [`Transport::wait_activity`],
//! which is the primitive the wait set blocks on. Take-like operations are
//! tri-state: `Ok(Some(_))` is data, `Ok(None)` is the non-error "nothing
//! available" outcome, and `Err(_)` is a hard failure carrying the
//! transport's diagnostic text.

use crate::{
    entity::{EntityKind, RawEntity, RawNode},
    error::Result,
    qos::Profile,
};
use std::time::Duration;

/// Identifies a taken request for the purpose of answering it.
///
/// Captured by [`Transport::take_request`] and consumed by
/// [`Transport::send_response`]. The transport accepts each id exactly once;
/// answering an unknown or already-answered id is a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId {
    /// The client entity the response must be routed back to.
    pub writer: RawEntity,
    /// Sequence number the client's transport attached to the request.
    pub sequence_number: i64,
}

/// Capabilities consumed from the underlying transport library.
pub trait Transport: Send + Sync {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Register a node. Names are already validated by the caller.
    fn create_node(&self, name: &str, namespace: &str) -> Result<RawNode>;

    /// Finalize a node. All of its entities must already be finalized.
    fn destroy_node(&self, node: RawNode) -> Result<()>;

    /// Create a communication entity owned by `node`.
    ///
    /// `name` is the fully qualified topic or service name; `type_name` is
    /// the wire type identifier. Construction either completes fully or
    /// fails with nothing registered.
    fn create_entity(
        &self,
        node: RawNode,
        kind: EntityKind,
        name: &str,
        type_name: &str,
        qos: &Profile,
    ) -> Result<RawEntity>;

    /// Finalize an entity while its owning node is still valid.
    fn destroy_entity(&self, kind: EntityKind, entity: RawEntity, node: RawNode) -> Result<()>;

    /// Create a node-independent guard condition.
    fn create_guard_condition(&self) -> Result<RawEntity>;

    /// Mark a guard condition ready and wake blocked waiters.
    fn trigger_guard_condition(&self, guard: RawEntity) -> Result<()>;

    /// Finalize a guard condition.
    fn destroy_guard_condition(&self, guard: RawEntity) -> Result<()>;

    // ------------------------------------------------------------------
    // Data plane
    // ------------------------------------------------------------------

    /// Hand a message to the transport's send queue. Non-blocking.
    fn publish(&self, publisher: RawEntity, payload: &[u8]) -> Result<()>;

    /// Take exactly one pending message, if any.
    fn take(&self, subscription: RawEntity) -> Result<Option<Vec<u8>>>;

    /// Send a request and return the transport-assigned sequence number.
    /// Sequence numbers increase monotonically per client.
    fn send_request(&self, client: RawEntity, payload: &[u8]) -> Result<i64>;

    /// Take the response tagged with `sequence_number`, if it has arrived.
    /// A number that was never issued simply never matches.
    fn take_response(&self, client: RawEntity, sequence_number: i64) -> Result<Option<Vec<u8>>>;

    /// Take one pending request together with its correlation id.
    fn take_request(&self, service: RawEntity) -> Result<Option<(Vec<u8>, RequestId)>>;

    /// Answer a previously taken request. Consumes the id: a second call
    /// with the same id fails.
    fn send_response(&self, service: RawEntity, request: RequestId, payload: &[u8]) -> Result<()>;

    // ------------------------------------------------------------------
    // Readiness
    // ------------------------------------------------------------------

    /// Non-consuming readiness probe.
    fn entity_ready(&self, kind: EntityKind, entity: RawEntity) -> bool;

    /// Readiness observation performed by a finishing wait cycle.
    /// Identical to [`Transport::entity_ready`] except that observing a
    /// ready guard condition consumes its trigger.
    fn take_ready(&self, kind: EntityKind, entity: RawEntity) -> bool;

    /// Current value of the activity cursor. The cursor advances on every
    /// event that could change some entity's readiness.
    fn activity_cursor(&self) -> u64;

    /// Block until the activity cursor differs from `seen` or `timeout`
    /// elapses (`None` blocks indefinitely). Returns the current cursor.
    fn wait_activity(&self, seen: u64, timeout: Option<Duration>) -> Result<u64>;

    // ------------------------------------------------------------------
    // Graph introspection (read-only)
    // ------------------------------------------------------------------

    /// All (topic name, type name) pairs currently discoverable, sorted and
    /// deduplicated.
    fn topic_names_and_types(&self, node: RawNode) -> Result<Vec<(String, String)>>;

    /// Number of live publishers on a fully qualified topic name.
    fn count_publishers(&self, topic: &str) -> usize;

    /// Number of live subscriptions on a fully qualified topic name.
    fn count_subscribers(&self, topic: &str) -> usize;

    /// Whether at least one server is registered on a fully qualified
    /// service name.
    fn service_is_available(&self, service: &str) -> bool;
}
