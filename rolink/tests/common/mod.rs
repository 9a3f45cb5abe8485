#![allow(dead_code)]
#![allow(non_camel_case_types)]

use rolink::{Context, Error, Result, ServiceMsg, TypeSupport};
use rolink_mem::MemTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

macro_rules! impl_type_support {
    ($ty:ident, $name:literal) => {
        impl TypeSupport for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn to_wire(&self) -> Result<Vec<u8>> {
                serde_json::to_vec(self).map_err(|e| Error::Conversion(e.to_string()))
            }

            fn from_wire(wire: &[u8]) -> Result<Self> {
                serde_json::from_slice(wire).map_err(|e| Error::Conversion(e.to_string()))
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Int64 {
    pub data: i64,
}

impl_type_support!(Int64, "example_interfaces/msg/Int64");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTwoInts_Request {
    pub a: i64,
    pub b: i64,
}

impl_type_support!(AddTwoInts_Request, "example_interfaces/srv/AddTwoInts_Request");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTwoInts_Response {
    pub sum: i64,
}

impl_type_support!(AddTwoInts_Response, "example_interfaces/srv/AddTwoInts_Response");

pub struct AddTwoInts;

impl ServiceMsg for AddTwoInts {
    type Request = AddTwoInts_Request;
    type Response = AddTwoInts_Response;

    fn type_name() -> &'static str {
        "example_interfaces/srv/AddTwoInts"
    }
}

/// Fresh context over its own loopback transport.
pub fn new_context() -> Result<Context> {
    Context::new(Arc::new(MemTransport::new()))
}

/// Topic name that cannot collide across tests sharing a transport.
pub fn unique_topic(prefix: &str) -> String {
    format!("{prefix}_{}", rand::random::<u32>())
}
