//! Wait-set based communication layer for robotics processes.
//!
//! This crate exposes publish/subscribe topics and request/response services
//! over an abstract messaging transport and multiplexes the readiness of
//! many endpoints onto a single blocking wait, so one thread can service all
//! of them without busy-polling.
//!
//! # Architecture
//!
//! - A [`Context`] owns the transport handle and the process lifecycle.
//! - [`Node`]s create and finally tear down entities.
//! - [`Publisher`]/[`Subscriber`] carry topic traffic;
//!   [`Client`]/[`Server`] carry service traffic correlated by
//!   transport-assigned sequence numbers.
//! - A [`WaitSet`] aggregates entity handles into fixed-capacity category
//!   arrays and blocks until any of them is ready.
//! - A [`Selector`] drives the clear/populate/wait/drain cycle and invokes
//!   registered callbacks; this is the primary mechanism for
//!   single-threaded event-driven applications.
//!
//! The transport itself (delivery, QoS enforcement, discovery data) lives
//! behind [`rolink_core::Transport`]; see the `rolink-mem` crate for the
//! in-process loopback implementation used by the tests.
//!
//! # Example
//!
//! ```ignore
//! use rolink::{Context, RecvResult};
//! use std::sync::Arc;
//!
//! let ctx = Context::new(Arc::new(rolink_mem::MemTransport::new()))?;
//! let node = ctx.create_node("listener", None)?;
//! let subscriber = node.create_subscriber::<MyMsg>("chatter", None)?;
//!
//! let mut selector = ctx.create_selector()?;
//! selector.add_subscriber(subscriber, Box::new(|msg| {
//!     println!("received: {msg:?}");
//! }));
//!
//! while ctx.ok() {
//!     selector.wait()?;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod context;
pub mod logger;
pub mod node;
pub mod selector;
pub mod service;
pub mod signal_handler;
pub mod topic;
pub mod wait_set;

use std::{cell::Cell, marker::PhantomData, sync::MutexGuard};

pub(crate) type PhantomUnsync = PhantomData<Cell<()>>;
pub(crate) type PhantomUnsend = PhantomData<MutexGuard<'static, ()>>;

// Re-exports
pub use context::Context;
pub use node::Node;
pub use selector::{Selector, guard_condition::GuardCondition};
pub use service::{Header, client::Client, client::ClientRecv, server::Server, server::ServerSend};
pub use topic::{publisher::Publisher, subscriber::Subscriber};
pub use wait_set::{Capacities, Timeout, WaitResult, WaitSet};

// Re-export core vocabulary
pub use rolink_core::{
    CallbackResult, EntityKind, Error, Profile, RecvResult, Result, ServiceMsg, Transport,
    TypeSupport, WaitHandle,
    qos::{DurabilityPolicy, HistoryPolicy, ReliabilityPolicy},
};
