//! Publisher to send messages on a topic.

use crate::node::Node;
use rolink_core::{
    entity::{EntityKind, RawEntity},
    error::Result,
    msg::TypeSupport,
    qos::Profile,
};
use std::{marker::PhantomData, sync::Arc};
use tracing::warn;

pub(crate) struct PublisherData {
    pub(crate) raw: RawEntity,
    pub(crate) node: Arc<Node>,
    topic_name: String,
}

impl Drop for PublisherData {
    fn drop(&mut self) {
        if let Err(e) =
            self.node
                .transport()
                .destroy_entity(EntityKind::Publisher, self.raw, self.node.raw())
        {
            warn!(topic = %self.topic_name, "failed to destroy publisher: {e}");
        }
    }
}

/// Publisher.
///
/// # Example
///
/// ```ignore
/// let publisher = node.create_publisher::<MyMsg>("chatter", None)?;
/// publisher.send(&MyMsg { data: 10 })?;
/// ```
pub struct Publisher<T> {
    pub(crate) data: Arc<PublisherData>,
    _phantom: PhantomData<T>,
}

impl<T: TypeSupport> Publisher<T> {
    pub(crate) fn new(node: Arc<Node>, fq_topic_name: &str, qos: Profile) -> Result<Self> {
        let raw = node.transport().create_entity(
            node.raw(),
            EntityKind::Publisher,
            fq_topic_name,
            T::type_name(),
            &qos,
        )?;
        Ok(Publisher {
            data: Arc::new(PublisherData {
                raw,
                node,
                topic_name: fq_topic_name.to_string(),
            }),
            _phantom: PhantomData,
        })
    }

    /// Get the fully qualified topic name.
    pub fn topic_name(&self) -> &str {
        &self.data.topic_name
    }

    /// Get the owning node.
    pub fn node(&self) -> &Arc<Node> {
        &self.data.node
    }

    /// Publish a message.
    ///
    /// Non-blocking from the caller's perspective: the message is handed to
    /// the transport's send queue. Failures are reported, never dropped.
    pub fn send(&self, msg: &T) -> Result<()> {
        let payload = msg.to_wire()?;
        self.data.node.transport().publish(self.data.raw, &payload)
    }
}
