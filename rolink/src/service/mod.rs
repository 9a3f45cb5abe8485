//! Service clients and servers.

pub mod client;
pub mod server;

use rolink_core::transport::RequestId;

/// Metadata delivered with a taken request or response.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub(crate) request: RequestId,
}

impl Header {
    /// Sequence number correlating the request with its response.
    pub fn sequence_number(&self) -> i64 {
        self.request.sequence_number
    }
}
