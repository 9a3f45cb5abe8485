//! Subscriber to receive messages from a topic.
//!
//! `try_recv` is non-blocking; use it from a selector callback after a wait
//! cycle marked the subscription ready. Exactly one message is consumed per
//! call.

use crate::{PhantomUnsync, node::Node};
use rolink_core::{
    entity::{EntityKind, RawEntity, WaitHandle},
    error::{RecvResult, Result},
    msg::TypeSupport,
    qos::Profile,
};
use std::{marker::PhantomData, sync::Arc};
use tracing::warn;

pub(crate) struct SubscriberData {
    pub(crate) raw: RawEntity,
    pub(crate) node: Arc<Node>,
    topic_name: String,
}

impl Drop for SubscriberData {
    fn drop(&mut self) {
        if let Err(e) = self.node.transport().destroy_entity(
            EntityKind::Subscription,
            self.raw,
            self.node.raw(),
        ) {
            warn!(topic = %self.topic_name, "failed to destroy subscription: {e}");
        }
    }
}

/// Subscriber.
///
/// # Example
///
/// ```ignore
/// let subscriber = node.create_subscriber::<MyMsg>("chatter", None)?;
/// match subscriber.try_recv() {
///     RecvResult::Ok(msg) => println!("received: {msg:?}"),
///     RecvResult::RetryLater => {} // nothing pending
///     RecvResult::Err(e) => eprintln!("error: {e}"),
/// }
/// ```
pub struct Subscriber<T> {
    pub(crate) data: Arc<SubscriberData>,
    _phantom: PhantomData<T>,
    _unsync: PhantomUnsync,
}

impl<T: TypeSupport> Subscriber<T> {
    pub(crate) fn new(node: Arc<Node>, fq_topic_name: &str, qos: Profile) -> Result<Self> {
        let raw = node.transport().create_entity(
            node.raw(),
            EntityKind::Subscription,
            fq_topic_name,
            T::type_name(),
            &qos,
        )?;
        Ok(Subscriber {
            data: Arc::new(SubscriberData {
                raw,
                node,
                topic_name: fq_topic_name.to_string(),
            }),
            _phantom: PhantomData,
            _unsync: PhantomData,
        })
    }

    /// Get the fully qualified topic name.
    pub fn topic_name(&self) -> &str {
        &self.data.topic_name
    }

    /// Non-owning reference for wait-set registration.
    pub fn handle(&self) -> WaitHandle {
        WaitHandle {
            kind: EntityKind::Subscription,
            raw: self.data.raw,
        }
    }

    /// Take exactly one message, without blocking.
    ///
    /// `RetryLater` is the normal outcome when nothing is pending - for
    /// example after a wait marked this subscription ready but a competing
    /// consumer drained it first.
    pub fn try_recv(&self) -> RecvResult<T> {
        match self.data.node.transport().take(self.data.raw) {
            Ok(Some(payload)) => match T::from_wire(&payload) {
                Ok(msg) => RecvResult::Ok(msg),
                Err(e) => RecvResult::Err(e),
            },
            Ok(None) => RecvResult::RetryLater,
            Err(e) => RecvResult::Err(e),
        }
    }
}
