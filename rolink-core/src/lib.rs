//! Core traits and types for the rolink communication layer.
//!
//! This crate provides the foundational vocabulary shared by the rolink
//! client layer and its transport backends, without depending on any
//! specific backend: error types, QoS profiles, entity kinds and handles,
//! message/service type capabilities, name rules, and the abstract
//! [`Transport`] boundary.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod entity;
pub mod error;
pub mod msg;
pub mod names;
pub mod qos;
pub mod selector;
pub mod transport;

// Re-export commonly used types
pub use entity::{EntityKind, RawEntity, RawNode, WaitHandle};
pub use error::{Error, RecvResult, Result};
pub use msg::{ServiceMsg, TypeSupport};
pub use qos::{DurabilityPolicy, HistoryPolicy, Profile, ReliabilityPolicy};
pub use selector::{CallbackResult, ConditionHandler};
pub use transport::{RequestId, Transport};
