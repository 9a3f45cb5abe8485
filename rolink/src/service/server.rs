//! Server to receive a request and send the reply.
//!
//! Taking a request yields a [`ServerSend`] reply token alongside the
//! request data. The token is consumed by sending the response, so exactly
//! one response can be sent per taken request; re-use does not compile.

use super::Header;
use crate::{PhantomUnsync, node::Node};
use rolink_core::{
    entity::{EntityKind, RawEntity, WaitHandle},
    error::{RecvResult, Result},
    msg::{ServiceMsg, TypeSupport},
    qos::Profile,
    transport::RequestId,
};
use std::{marker::PhantomData, sync::Arc};
use tracing::warn;

pub(crate) struct ServerData {
    pub(crate) raw: RawEntity,
    pub(crate) node: Arc<Node>,
    service_name: String,
}

impl Drop for ServerData {
    fn drop(&mut self) {
        if let Err(e) = self.node.transport().destroy_entity(
            EntityKind::ServiceServer,
            self.raw,
            self.node.raw(),
        ) {
            warn!(service = %self.service_name, "failed to destroy server: {e}");
        }
    }
}

/// Service server.
///
/// # Example
///
/// ```ignore
/// let server = node.create_server::<AddTwoInts>("add_two_ints", None)?;
/// match server.try_recv() {
///     RecvResult::Ok((sender, request, _header)) => {
///         sender.send(&AddTwoInts_Response { sum: request.a + request.b })?;
///     }
///     RecvResult::RetryLater => {} // nothing pending
///     RecvResult::Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[must_use]
pub struct Server<T: ServiceMsg> {
    pub(crate) data: Arc<ServerData>,
    _phantom: PhantomData<T>,
    _unsync: PhantomUnsync,
}

impl<T: ServiceMsg> Server<T> {
    pub(crate) fn new(node: Arc<Node>, fq_service_name: &str, qos: Profile) -> Result<Self> {
        let raw = node.transport().create_entity(
            node.raw(),
            EntityKind::ServiceServer,
            fq_service_name,
            T::type_name(),
            &qos,
        )?;
        Ok(Server {
            data: Arc::new(ServerData {
                raw,
                node,
                service_name: fq_service_name.to_string(),
            }),
            _phantom: PhantomData,
            _unsync: PhantomData,
        })
    }

    /// Get the fully qualified service name.
    pub fn service_name(&self) -> &str {
        &self.data.service_name
    }

    /// Non-owning reference for wait-set registration.
    pub fn handle(&self) -> WaitHandle {
        WaitHandle {
            kind: EntityKind::ServiceServer,
            raw: self.data.raw,
        }
    }

    /// Take one pending request, without blocking.
    ///
    /// On success the returned [`ServerSend`] must be used to answer the
    /// request; dropping it leaves the request unanswered.
    pub fn try_recv(&self) -> RecvResult<(ServerSend<T>, T::Request, Header)> {
        match self.data.node.transport().take_request(self.data.raw) {
            Ok(Some((payload, request_id))) => match T::Request::from_wire(&payload) {
                Ok(request) => RecvResult::Ok((
                    ServerSend {
                        data: self.data.clone(),
                        request_id,
                        _phantom: PhantomData,
                    },
                    request,
                    Header {
                        request: request_id,
                    },
                )),
                Err(e) => RecvResult::Err(e),
            },
            Ok(None) => RecvResult::RetryLater,
            Err(e) => RecvResult::Err(e),
        }
    }
}

/// One-shot reply token for a taken request.
///
/// [`ServerSend::send`] consumes the token; the transport additionally
/// rejects a request id that was already answered, so the
/// one-token-one-response discipline fails loudly even across forged ids.
#[must_use]
pub struct ServerSend<T: ServiceMsg> {
    data: Arc<ServerData>,
    request_id: RequestId,
    _phantom: PhantomData<T>,
}

impl<T: ServiceMsg> ServerSend<T> {
    /// Correlation metadata of the request being answered.
    pub fn header(&self) -> Header {
        Header {
            request: self.request_id,
        }
    }

    /// Send the response, consuming the token.
    pub fn send(self, response: &T::Response) -> Result<()> {
        let payload = response.to_wire()?;
        self.data
            .node
            .transport()
            .send_response(self.data.raw, self.request_id, &payload)
    }
}
