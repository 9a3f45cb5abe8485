//! Message and service type capabilities.
//!
//! The client layer never inspects message contents. Each entity stores the
//! conversion capability of its type at creation time and invokes it on the
//! take/publish/send/respond paths; there is no runtime lookup.

use crate::error::Result;

/// Conversion capability between a native message value and its wire form.
///
/// The wire form is whatever the transport carries; this layer treats it as
/// an opaque byte sequence.
pub trait TypeSupport: Sized + Send + 'static {
    /// Fully qualified type name, e.g. `example_interfaces/msg/Int64`.
    fn type_name() -> &'static str;

    /// Convert the native value to its wire form.
    fn to_wire(&self) -> Result<Vec<u8>>;

    /// Reconstruct a native value from its wire form.
    fn from_wire(wire: &[u8]) -> Result<Self>;
}

/// A service type: a request/response pair sharing one service name.
pub trait ServiceMsg: 'static {
    /// Request message type.
    type Request: TypeSupport;
    /// Response message type.
    type Response: TypeSupport;

    /// Fully qualified service type name, e.g. `example_interfaces/srv/AddTwoInts`.
    fn type_name() -> &'static str;
}
