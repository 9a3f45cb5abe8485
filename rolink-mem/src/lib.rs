//! In-process loopback transport.
//!
//! [`MemTransport`] implements [`rolink_core::Transport`] entirely inside
//! one process: topic traffic is routed by (topic name, type name) into
//! per-subscription queues bounded by the QoS depth, service requests go
//! through bounded channels to the earliest-registered live server, and
//! responses are routed back to the originating client tagged with the
//! request's sequence number.
//!
//! There is no wire format and no discovery protocol here; payloads are the
//! opaque byte sequences the client layer produced, and the "graph" is this
//! transport's own registry.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! let ctx = rolink::Context::new(Arc::new(rolink_mem::MemTransport::new()))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use rolink_core::{
    entity::{EntityKind, RawEntity, RawNode},
    error::{Error, Result},
    qos::{HistoryPolicy, Profile},
    transport::{RequestId, Transport},
};
use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    time::{Duration, Instant},
};
use tracing::{debug, trace};

struct NodeRec {
    name: String,
    namespace: String,
    entities: HashSet<u64>,
}

struct PublisherRec {
    node: u64,
    topic: String,
    type_name: String,
}

struct SubscriptionRec {
    node: u64,
    topic: String,
    type_name: String,
    /// `None` keeps all samples.
    depth: Option<usize>,
    queue: VecDeque<Vec<u8>>,
}

struct ClientRec {
    node: u64,
    service: String,
    type_name: String,
    next_seq: i64,
    responses: VecDeque<(i64, Vec<u8>)>,
}

struct ServiceRec {
    node: u64,
    service: String,
    type_name: String,
    sender: Sender<(RequestId, Vec<u8>)>,
    receiver: Receiver<(RequestId, Vec<u8>)>,
    /// Request ids taken but not yet answered; `send_response` consumes an
    /// entry, so answering twice fails loudly.
    taken: HashSet<(u64, i64)>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    nodes: HashMap<u64, NodeRec>,
    publishers: HashMap<u64, PublisherRec>,
    subscriptions: HashMap<u64, SubscriptionRec>,
    clients: HashMap<u64, ClientRec>,
    services: HashMap<u64, ServiceRec>,
    guards: HashMap<u64, bool>,
}

impl Registry {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn node(&self, node: RawNode) -> Result<&NodeRec> {
        self.nodes
            .get(&node.0)
            .ok_or_else(|| Error::Transport(format!("unknown node handle {}", node.0)))
    }
}

/// In-process transport backed by a registry of queues.
pub struct MemTransport {
    registry: Mutex<Registry>,
    activity: Mutex<u64>,
    activity_cond: Condvar,
}

impl Default for MemTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        MemTransport {
            registry: Mutex::new(Registry::default()),
            activity: Mutex::new(0),
            activity_cond: Condvar::new(),
        }
    }

    /// Advance the activity cursor and wake blocked waiters.
    fn bump(&self) {
        let mut cursor = self.activity.lock();
        *cursor += 1;
        self.activity_cond.notify_all();
    }
}

impl Transport for MemTransport {
    fn create_node(&self, name: &str, namespace: &str) -> Result<RawNode> {
        let mut registry = self.registry.lock();
        let id = registry.allocate_id();
        registry.nodes.insert(
            id,
            NodeRec {
                name: name.to_string(),
                namespace: namespace.to_string(),
                entities: HashSet::new(),
            },
        );
        debug!(node = name, namespace, id, "registered node");
        Ok(RawNode(id))
    }

    fn destroy_node(&self, node: RawNode) -> Result<()> {
        let mut registry = self.registry.lock();
        let rec = registry.node(node)?;
        if !rec.entities.is_empty() {
            return Err(Error::Transport(format!(
                "node '{}' still has {} live entities",
                rec.name,
                rec.entities.len()
            )));
        }
        registry.nodes.remove(&node.0);
        Ok(())
    }

    fn create_entity(
        &self,
        node: RawNode,
        kind: EntityKind,
        name: &str,
        type_name: &str,
        qos: &Profile,
    ) -> Result<RawEntity> {
        let mut registry = self.registry.lock();
        registry.node(node)?;
        let id = registry.allocate_id();

        match kind {
            EntityKind::Publisher => {
                registry.publishers.insert(
                    id,
                    PublisherRec {
                        node: node.0,
                        topic: name.to_string(),
                        type_name: type_name.to_string(),
                    },
                );
            }
            EntityKind::Subscription => {
                let depth = match qos.history {
                    HistoryPolicy::KeepLast => Some(qos.depth.max(1)),
                    HistoryPolicy::KeepAll => None,
                };
                registry.subscriptions.insert(
                    id,
                    SubscriptionRec {
                        node: node.0,
                        topic: name.to_string(),
                        type_name: type_name.to_string(),
                        depth,
                        queue: VecDeque::new(),
                    },
                );
            }
            EntityKind::ServiceClient => {
                registry.clients.insert(
                    id,
                    ClientRec {
                        node: node.0,
                        service: name.to_string(),
                        type_name: type_name.to_string(),
                        next_seq: 1,
                        responses: VecDeque::new(),
                    },
                );
            }
            EntityKind::ServiceServer => {
                let (sender, receiver) = match qos.history {
                    HistoryPolicy::KeepLast => crossbeam_channel::bounded(qos.depth.max(1)),
                    HistoryPolicy::KeepAll => crossbeam_channel::unbounded(),
                };
                registry.services.insert(
                    id,
                    ServiceRec {
                        node: node.0,
                        service: name.to_string(),
                        type_name: type_name.to_string(),
                        sender,
                        receiver,
                        taken: HashSet::new(),
                    },
                );
            }
            EntityKind::Node | EntityKind::GuardCondition | EntityKind::Timer => {
                return Err(Error::Transport(format!(
                    "{kind} entities are not created through create_entity"
                )));
            }
        }

        if let Some(rec) = registry.nodes.get_mut(&node.0) {
            rec.entities.insert(id);
        }
        debug!(%kind, name, type_name, id, "registered entity");
        Ok(RawEntity(id))
    }

    fn destroy_entity(&self, kind: EntityKind, entity: RawEntity, node: RawNode) -> Result<()> {
        let mut registry = self.registry.lock();
        let removed = match kind {
            EntityKind::Publisher => registry.publishers.remove(&entity.0).is_some(),
            EntityKind::Subscription => registry.subscriptions.remove(&entity.0).is_some(),
            EntityKind::ServiceClient => registry.clients.remove(&entity.0).is_some(),
            EntityKind::ServiceServer => registry.services.remove(&entity.0).is_some(),
            _ => false,
        };
        if !removed {
            return Err(Error::Transport(format!(
                "no {kind} with handle {} to destroy",
                entity.0
            )));
        }
        if let Some(rec) = registry.nodes.get_mut(&node.0) {
            rec.entities.remove(&entity.0);
        }
        Ok(())
    }

    fn create_guard_condition(&self) -> Result<RawEntity> {
        let mut registry = self.registry.lock();
        let id = registry.allocate_id();
        registry.guards.insert(id, false);
        Ok(RawEntity(id))
    }

    fn trigger_guard_condition(&self, guard: RawEntity) -> Result<()> {
        {
            let mut registry = self.registry.lock();
            let Some(flag) = registry.guards.get_mut(&guard.0) else {
                return Err(Error::Transport(format!(
                    "unknown guard condition handle {}",
                    guard.0
                )));
            };
            *flag = true;
        }
        self.bump();
        Ok(())
    }

    fn destroy_guard_condition(&self, guard: RawEntity) -> Result<()> {
        let mut registry = self.registry.lock();
        if registry.guards.remove(&guard.0).is_none() {
            return Err(Error::Transport(format!(
                "unknown guard condition handle {}",
                guard.0
            )));
        }
        Ok(())
    }

    fn publish(&self, publisher: RawEntity, payload: &[u8]) -> Result<()> {
        {
            let mut registry = self.registry.lock();
            let Some(rec) = registry.publishers.get(&publisher.0) else {
                return Err(Error::Transport(format!(
                    "unknown publisher handle {}",
                    publisher.0
                )));
            };
            let (topic, type_name) = (rec.topic.clone(), rec.type_name.clone());

            for sub in registry.subscriptions.values_mut() {
                if sub.topic != topic || sub.type_name != type_name {
                    continue;
                }
                if let Some(depth) = sub.depth
                    && sub.queue.len() >= depth
                {
                    // KeepLast: drop the oldest sample
                    sub.queue.pop_front();
                    trace!(topic = %sub.topic, "subscription queue full, dropped oldest sample");
                }
                sub.queue.push_back(payload.to_vec());
            }
        }
        self.bump();
        Ok(())
    }

    fn take(&self, subscription: RawEntity) -> Result<Option<Vec<u8>>> {
        let mut registry = self.registry.lock();
        let Some(rec) = registry.subscriptions.get_mut(&subscription.0) else {
            return Err(Error::Transport(format!(
                "unknown subscription handle {}",
                subscription.0
            )));
        };
        Ok(rec.queue.pop_front())
    }

    fn send_request(&self, client: RawEntity, payload: &[u8]) -> Result<i64> {
        let (seq, target) = {
            let mut registry = self.registry.lock();
            let Some(rec) = registry.clients.get_mut(&client.0) else {
                return Err(Error::Transport(format!(
                    "unknown client handle {}",
                    client.0
                )));
            };
            let seq = rec.next_seq;
            rec.next_seq += 1;
            let (service, type_name) = (rec.service.clone(), rec.type_name.clone());

            // earliest-registered live server on the service answers
            let target = registry
                .services
                .iter()
                .filter(|(_, s)| s.service == service && s.type_name == type_name)
                .min_by_key(|(id, _)| **id)
                .map(|(_, s)| (s.service.clone(), s.sender.clone()));
            (seq, target)
        };

        if let Some((service, sender)) = target {
            let request = RequestId {
                writer: client,
                sequence_number: seq,
            };
            match sender.try_send((request, payload.to_vec())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    return Err(Error::Transport(format!(
                        "request queue full for service '{service}'"
                    )));
                }
                // the server disappeared between lookup and send; like an
                // absent server, the request is lost and never answered
                Err(TrySendError::Disconnected(_)) => {}
            }
        }

        self.bump();
        Ok(seq)
    }

    fn take_response(&self, client: RawEntity, sequence_number: i64) -> Result<Option<Vec<u8>>> {
        let mut registry = self.registry.lock();
        let Some(rec) = registry.clients.get_mut(&client.0) else {
            return Err(Error::Transport(format!(
                "unknown client handle {}",
                client.0
            )));
        };
        let position = rec
            .responses
            .iter()
            .position(|(seq, _)| *seq == sequence_number);
        Ok(position
            .and_then(|index| rec.responses.remove(index))
            .map(|(_, payload)| payload))
    }

    fn take_request(&self, service: RawEntity) -> Result<Option<(Vec<u8>, RequestId)>> {
        let receiver = {
            let registry = self.registry.lock();
            let Some(rec) = registry.services.get(&service.0) else {
                return Err(Error::Transport(format!(
                    "unknown service handle {}",
                    service.0
                )));
            };
            rec.receiver.clone()
        };

        match receiver.try_recv() {
            Ok((request, payload)) => {
                let mut registry = self.registry.lock();
                if let Some(rec) = registry.services.get_mut(&service.0) {
                    rec.taken
                        .insert((request.writer.0, request.sequence_number));
                }
                Ok(Some((payload, request)))
            }
            Err(_) => Ok(None),
        }
    }

    fn send_response(&self, service: RawEntity, request: RequestId, payload: &[u8]) -> Result<()> {
        {
            let mut registry = self.registry.lock();
            let Some(rec) = registry.services.get_mut(&service.0) else {
                return Err(Error::Transport(format!(
                    "unknown service handle {}",
                    service.0
                )));
            };
            if !rec
                .taken
                .remove(&(request.writer.0, request.sequence_number))
            {
                return Err(Error::Transport(format!(
                    "no pending request with sequence number {} (unknown or already answered)",
                    request.sequence_number
                )));
            }
            // a destroyed client silently misses its response
            if let Some(client) = registry.clients.get_mut(&request.writer.0) {
                client
                    .responses
                    .push_back((request.sequence_number, payload.to_vec()));
            }
        }
        self.bump();
        Ok(())
    }

    fn entity_ready(&self, kind: EntityKind, entity: RawEntity) -> bool {
        let registry = self.registry.lock();
        match kind {
            EntityKind::Subscription => registry
                .subscriptions
                .get(&entity.0)
                .is_some_and(|rec| !rec.queue.is_empty()),
            EntityKind::ServiceClient => registry
                .clients
                .get(&entity.0)
                .is_some_and(|rec| !rec.responses.is_empty()),
            EntityKind::ServiceServer => registry
                .services
                .get(&entity.0)
                .is_some_and(|rec| !rec.receiver.is_empty()),
            EntityKind::GuardCondition => registry.guards.get(&entity.0).copied().unwrap_or(false),
            EntityKind::Node | EntityKind::Publisher | EntityKind::Timer => false,
        }
    }

    fn take_ready(&self, kind: EntityKind, entity: RawEntity) -> bool {
        if kind == EntityKind::GuardCondition {
            let mut registry = self.registry.lock();
            if let Some(flag) = registry.guards.get_mut(&entity.0) {
                return std::mem::replace(flag, false);
            }
            return false;
        }
        self.entity_ready(kind, entity)
    }

    fn activity_cursor(&self) -> u64 {
        *self.activity.lock()
    }

    fn wait_activity(&self, seen: u64, timeout: Option<Duration>) -> Result<u64> {
        let mut cursor = self.activity.lock();
        match timeout {
            None => {
                while *cursor == seen {
                    self.activity_cond.wait(&mut cursor);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *cursor == seen {
                    if self
                        .activity_cond
                        .wait_until(&mut cursor, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
        }
        Ok(*cursor)
    }

    fn topic_names_and_types(&self, node: RawNode) -> Result<Vec<(String, String)>> {
        let registry = self.registry.lock();
        registry.node(node)?;
        let pairs: BTreeSet<(String, String)> = registry
            .publishers
            .values()
            .map(|rec| (rec.topic.clone(), rec.type_name.clone()))
            .chain(
                registry
                    .subscriptions
                    .values()
                    .map(|rec| (rec.topic.clone(), rec.type_name.clone())),
            )
            .collect();
        Ok(pairs.into_iter().collect())
    }

    fn count_publishers(&self, topic: &str) -> usize {
        let registry = self.registry.lock();
        registry
            .publishers
            .values()
            .filter(|rec| rec.topic == topic)
            .count()
    }

    fn count_subscribers(&self, topic: &str) -> usize {
        let registry = self.registry.lock();
        registry
            .subscriptions
            .values()
            .filter(|rec| rec.topic == topic)
            .count()
    }

    fn service_is_available(&self, service: &str) -> bool {
        let registry = self.registry.lock();
        registry.services.values().any(|rec| rec.service == service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::default()
    }

    fn setup() -> (MemTransport, RawNode) {
        let transport = MemTransport::new();
        let node = transport.create_node("test_node", "").unwrap();
        (transport, node)
    }

    #[test]
    fn keep_last_drops_oldest_at_depth() {
        let (transport, node) = setup();
        let qos = Profile {
            depth: 2,
            ..Profile::default()
        };
        let publisher = transport
            .create_entity(node, EntityKind::Publisher, "/chatter", "T", &qos)
            .unwrap();
        let subscription = transport
            .create_entity(node, EntityKind::Subscription, "/chatter", "T", &qos)
            .unwrap();

        for payload in [b"a", b"b", b"c"] {
            transport.publish(publisher, payload).unwrap();
        }
        assert_eq!(transport.take(subscription).unwrap().unwrap(), b"b");
        assert_eq!(transport.take(subscription).unwrap().unwrap(), b"c");
        assert_eq!(transport.take(subscription).unwrap(), None);
    }

    #[test]
    fn mismatched_type_is_not_delivered() {
        let (transport, node) = setup();
        let publisher = transport
            .create_entity(node, EntityKind::Publisher, "/chatter", "A", &profile())
            .unwrap();
        let subscription = transport
            .create_entity(node, EntityKind::Subscription, "/chatter", "B", &profile())
            .unwrap();

        transport.publish(publisher, b"payload").unwrap();
        assert_eq!(transport.take(subscription).unwrap(), None);
    }

    #[test]
    fn responses_match_out_of_order() {
        let (transport, node) = setup();
        let client = transport
            .create_entity(node, EntityKind::ServiceClient, "/add", "S", &profile())
            .unwrap();
        let service = transport
            .create_entity(node, EntityKind::ServiceServer, "/add", "S", &profile())
            .unwrap();

        let seq1 = transport.send_request(client, b"one").unwrap();
        let seq2 = transport.send_request(client, b"two").unwrap();
        assert!(seq2 > seq1);

        let (_, req1) = transport.take_request(service).unwrap().unwrap();
        let (_, req2) = transport.take_request(service).unwrap().unwrap();

        // answer in reverse order
        transport.send_response(service, req2, b"resp2").unwrap();
        transport.send_response(service, req1, b"resp1").unwrap();

        assert_eq!(
            transport.take_response(client, seq1).unwrap().unwrap(),
            b"resp1"
        );
        assert_eq!(
            transport.take_response(client, seq2).unwrap().unwrap(),
            b"resp2"
        );
        assert_eq!(transport.take_response(client, seq1).unwrap(), None);
    }

    #[test]
    fn answering_twice_fails_loudly() {
        let (transport, node) = setup();
        let client = transport
            .create_entity(node, EntityKind::ServiceClient, "/add", "S", &profile())
            .unwrap();
        let service = transport
            .create_entity(node, EntityKind::ServiceServer, "/add", "S", &profile())
            .unwrap();

        transport.send_request(client, b"req").unwrap();
        let (_, request) = transport.take_request(service).unwrap().unwrap();

        transport.send_response(service, request, b"resp").unwrap();
        let err = transport
            .send_response(service, request, b"resp")
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn destroy_node_with_live_entities_fails() {
        let (transport, node) = setup();
        let publisher = transport
            .create_entity(node, EntityKind::Publisher, "/chatter", "T", &profile())
            .unwrap();

        assert!(matches!(
            transport.destroy_node(node),
            Err(Error::Transport(_))
        ));

        transport
            .destroy_entity(EntityKind::Publisher, publisher, node)
            .unwrap();
        transport.destroy_node(node).unwrap();
    }

    #[test]
    fn guard_trigger_is_consumed_once() {
        let transport = MemTransport::new();
        let guard = transport.create_guard_condition().unwrap();

        assert!(!transport.entity_ready(EntityKind::GuardCondition, guard));
        transport.trigger_guard_condition(guard).unwrap();
        assert!(transport.entity_ready(EntityKind::GuardCondition, guard));
        assert!(transport.take_ready(EntityKind::GuardCondition, guard));
        assert!(!transport.entity_ready(EntityKind::GuardCondition, guard));
    }

    #[test]
    fn activity_cursor_advances_on_publish() {
        let (transport, node) = setup();
        let publisher = transport
            .create_entity(node, EntityKind::Publisher, "/chatter", "T", &profile())
            .unwrap();

        let before = transport.activity_cursor();
        transport.publish(publisher, b"payload").unwrap();
        let after = transport.wait_activity(before, Some(Duration::ZERO)).unwrap();
        assert!(after > before);
    }

    #[test]
    fn graph_reflects_creation_and_destruction() {
        let (transport, node) = setup();
        let publisher = transport
            .create_entity(node, EntityKind::Publisher, "/chatter", "T", &profile())
            .unwrap();

        assert_eq!(transport.count_publishers("/chatter"), 1);
        assert_eq!(
            transport.topic_names_and_types(node).unwrap(),
            vec![("/chatter".to_string(), "T".to_string())]
        );

        transport
            .destroy_entity(EntityKind::Publisher, publisher, node)
            .unwrap();
        assert_eq!(transport.count_publishers("/chatter"), 0);
        assert!(transport.topic_names_and_types(node).unwrap().is_empty());
    }
}
