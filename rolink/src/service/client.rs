//! Client to send a request and receive the reply.
//!
//! Sending returns a [`ClientRecv`] bound to the sequence number the
//! transport assigned to that request. Concurrent outstanding requests from
//! one client are valid; each receiver only ever matches its own sequence
//! number, so a stale or foreign response is simply never observed.

use super::Header;
use crate::{node::Node, selector::Selector};
use rolink_core::{
    entity::{EntityKind, RawEntity, WaitHandle},
    error::{RecvResult, Result},
    msg::{ServiceMsg, TypeSupport},
    qos::Profile,
    transport::RequestId,
};
use std::{marker::PhantomData, sync::Arc, time::Duration};
use tracing::warn;

pub(crate) struct ClientData {
    pub(crate) raw: RawEntity,
    pub(crate) node: Arc<Node>,
    service_name: String,
}

impl Drop for ClientData {
    fn drop(&mut self) {
        if let Err(e) = self.node.transport().destroy_entity(
            EntityKind::ServiceClient,
            self.raw,
            self.node.raw(),
        ) {
            warn!(service = %self.service_name, "failed to destroy client: {e}");
        }
    }
}

/// Service client.
///
/// # Example
///
/// ```ignore
/// let client = node.create_client::<AddTwoInts>("add_two_ints", None)?;
/// let (receiver, seq) = client.send_ret_seq(&AddTwoInts_Request { a: 1, b: 7 })?;
/// // ... drive a wait loop until the response arrives, then:
/// if let RecvResult::Ok((response, header)) = receiver.try_recv() {
///     assert_eq!(header.sequence_number(), seq);
/// }
/// ```
pub struct Client<T: ServiceMsg> {
    pub(crate) data: Arc<ClientData>,
    _phantom: PhantomData<T>,
}

impl<T: ServiceMsg> Client<T> {
    pub(crate) fn new(node: Arc<Node>, fq_service_name: &str, qos: Profile) -> Result<Self> {
        let raw = node.transport().create_entity(
            node.raw(),
            EntityKind::ServiceClient,
            fq_service_name,
            T::type_name(),
            &qos,
        )?;
        Ok(Client {
            data: Arc::new(ClientData {
                raw,
                node,
                service_name: fq_service_name.to_string(),
            }),
            _phantom: PhantomData,
        })
    }

    /// Get the fully qualified service name.
    pub fn service_name(&self) -> &str {
        &self.data.service_name
    }

    /// Whether at least one server is currently registered on this service.
    pub fn is_service_available(&self) -> bool {
        self.data
            .node
            .transport()
            .service_is_available(&self.data.service_name)
    }

    /// Send a request.
    pub fn send(&self, request: &T::Request) -> Result<ClientRecv<T>> {
        let (receiver, _) = self.send_ret_seq(request)?;
        Ok(receiver)
    }

    /// `send_ret_seq` is equivalent to [`Client::send`], but also returns
    /// the transport-assigned sequence number. Retain it to correlate the
    /// response.
    pub fn send_ret_seq(&self, request: &T::Request) -> Result<(ClientRecv<T>, i64)> {
        let payload = request.to_wire()?;
        let seq = self
            .data
            .node
            .transport()
            .send_request(self.data.raw, &payload)?;
        Ok((
            ClientRecv {
                data: self.data.clone(),
                seq,
                _phantom: PhantomData,
            },
            seq,
        ))
    }
}

/// Receiver for the response to one specific request.
#[must_use]
pub struct ClientRecv<T: ServiceMsg> {
    pub(crate) data: Arc<ClientData>,
    seq: i64,
    _phantom: PhantomData<T>,
}

impl<T: ServiceMsg> ClientRecv<T> {
    /// The sequence number this receiver is bound to.
    pub fn sequence_number(&self) -> i64 {
        self.seq
    }

    /// Non-owning reference for wait-set registration.
    pub fn handle(&self) -> WaitHandle {
        WaitHandle {
            kind: EntityKind::ServiceClient,
            raw: self.data.raw,
        }
    }

    /// Take the response if it has arrived, without blocking.
    ///
    /// `RetryLater` while no response with this sequence number is pending.
    /// A sequence number that was never issued stays `RetryLater` forever;
    /// giving up is the caller's policy, not this layer's.
    pub fn try_recv(&self) -> RecvResult<(T::Response, Header)> {
        match self
            .data
            .node
            .transport()
            .take_response(self.data.raw, self.seq)
        {
            Ok(Some(payload)) => match T::Response::from_wire(&payload) {
                Ok(response) => RecvResult::Ok((
                    response,
                    Header {
                        request: RequestId {
                            writer: self.data.raw,
                            sequence_number: self.seq,
                        },
                    },
                )),
                Err(e) => RecvResult::Err(e),
            },
            Ok(None) => RecvResult::RetryLater,
            Err(e) => RecvResult::Err(e),
        }
    }

    /// Wait up to `t` for the response using `selector`, then try once.
    ///
    /// The client is registered with the selector for a single wait cycle
    /// and removed afterwards; register again for every retry.
    pub fn recv_timeout(
        &self,
        t: Duration,
        selector: &mut Selector,
    ) -> RecvResult<(T::Response, Header)> {
        selector.add_client_recv(self);
        match selector.wait_timeout(t) {
            Ok(true) => self.try_recv(),
            Ok(false) => RecvResult::RetryLater,
            Err(e) => RecvResult::Err(e),
        }
    }
}
