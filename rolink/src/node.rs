//! Nodes: entity factories and final owners.
//!
//! A [`Node`] creates publishers, subscriptions, service clients, and
//! service servers, and answers read-only graph queries. Entities hold an
//! `Arc<Node>` back-reference, so a node is finalized only after every
//! entity it created has been finalized; the reverse order is
//! unrepresentable.

use crate::{
    context::Context,
    service::{client::Client, server::Server},
    topic::{publisher::Publisher, subscriber::Subscriber},
};
use rolink_core::{
    entity::RawNode,
    error::Result,
    msg::{ServiceMsg, TypeSupport},
    names,
    qos::Profile,
    transport::Transport,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// A node owning zero or more communication entities.
///
/// # Example
///
/// ```ignore
/// let node = ctx.create_node("talker", Some("/robot1"))?;
/// let publisher = node.create_publisher::<MyMsg>("chatter", None)?;
/// ```
pub struct Node {
    raw: RawNode,
    name: String,
    namespace: String,
    context: Context,
}

impl Node {
    pub(crate) fn new(context: Context, name: &str, namespace: &str) -> Result<Arc<Self>> {
        let raw = context.transport().create_node(name, namespace)?;
        debug!(node = name, namespace, "created node");
        Ok(Arc::new(Node {
            raw,
            name: name.to_string(),
            namespace: namespace.to_string(),
            context,
        }))
    }

    /// Get the node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the node namespace ("" denotes the root namespace).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get the fully qualified node name.
    pub fn fully_qualified_name(&self) -> String {
        names::build_node_fqn(&self.namespace, &self.name)
    }

    /// Get the parent context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Expand a topic or service name to its fully qualified form:
    /// absolute names are used as-is, relative names are prefixed with the
    /// node's namespace, and `~` is replaced with the node's FQN.
    pub fn resolve_name(&self, name: &str) -> Result<String> {
        names::expand_topic_name(&self.namespace, &self.name, name)
    }

    pub(crate) fn raw(&self) -> RawNode {
        self.raw
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        self.context.transport()
    }

    /// Create a publisher. `None` QoS means [`Profile::default`].
    pub fn create_publisher<T: TypeSupport>(
        self: &Arc<Self>,
        topic_name: &str,
        qos: Option<Profile>,
    ) -> Result<Publisher<T>> {
        let fq_topic_name = self.resolve_name(topic_name)?;
        Publisher::new(self.clone(), &fq_topic_name, qos.unwrap_or_default())
    }

    /// Create a subscriber. `None` QoS means [`Profile::default`].
    pub fn create_subscriber<T: TypeSupport>(
        self: &Arc<Self>,
        topic_name: &str,
        qos: Option<Profile>,
    ) -> Result<Subscriber<T>> {
        let fq_topic_name = self.resolve_name(topic_name)?;
        Subscriber::new(self.clone(), &fq_topic_name, qos.unwrap_or_default())
    }

    /// Create a service client. `None` QoS means [`Profile::services_default`].
    pub fn create_client<T: ServiceMsg>(
        self: &Arc<Self>,
        service_name: &str,
        qos: Option<Profile>,
    ) -> Result<Client<T>> {
        let fq_service_name = self.resolve_name(service_name)?;
        Client::new(
            self.clone(),
            &fq_service_name,
            qos.unwrap_or_else(Profile::services_default),
        )
    }

    /// Create a service server. `None` QoS means [`Profile::services_default`].
    pub fn create_server<T: ServiceMsg>(
        self: &Arc<Self>,
        service_name: &str,
        qos: Option<Profile>,
    ) -> Result<Server<T>> {
        let fq_service_name = self.resolve_name(service_name)?;
        Server::new(
            self.clone(),
            &fq_service_name,
            qos.unwrap_or_else(Profile::services_default),
        )
    }

    /// All (topic name, type name) pairs currently discoverable.
    pub fn topic_names_and_types(&self) -> Result<Vec<(String, String)>> {
        self.transport().topic_names_and_types(self.raw)
    }

    /// Number of live publishers on a topic. Relative names are resolved
    /// against this node.
    pub fn count_publishers(&self, topic_name: &str) -> Result<usize> {
        let fq = self.resolve_name(topic_name)?;
        Ok(self.transport().count_publishers(&fq))
    }

    /// Number of live subscriptions on a topic.
    pub fn count_subscribers(&self, topic_name: &str) -> Result<usize> {
        let fq = self.resolve_name(topic_name)?;
        Ok(self.transport().count_subscribers(&fq))
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Err(e) = self.context.transport().destroy_node(self.raw) {
            warn!(node = %self.name, "failed to destroy node: {e}");
        }
    }
}
