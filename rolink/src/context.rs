//! Process lifecycle and entity factories.
//!
//! A [`Context`] wraps the transport handle and the process lifecycle state.
//! Construction is initialization; [`Context::shutdown`] is an
//! idempotent-checked transition to the terminal state. All nodes created
//! from one context share its transport.

use crate::{
    node::Node,
    selector::{Selector, guard_condition::GuardCondition},
    signal_handler,
    wait_set::{Capacities, WaitSet},
};
use parking_lot::Mutex;
use rolink_core::{
    error::{Error, Result},
    names,
    transport::Transport,
};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a context. The pre-construction state is implicit: a
/// `Context` that does not exist yet has not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Running,
    ShutDown,
}

struct ContextInner {
    transport: Arc<dyn Transport>,
    state: Mutex<Lifecycle>,
}

/// Handle to a running communication context.
///
/// Cloning is cheap and shares the same lifecycle state.
///
/// # Example
///
/// ```ignore
/// let ctx = Context::new(transport)?;
/// let node = ctx.create_node("talker", Some("/robot1"))?;
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Initialize a context on top of `transport`.
    ///
    /// Also installs the process signal watcher (once per process) so that
    /// SIGINT/SIGTERM flip the halt flag observed by [`Context::ok`].
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        signal_handler::install_hook();
        Ok(Context {
            inner: Arc::new(ContextInner {
                transport,
                state: Mutex::new(Lifecycle::Running),
            }),
        })
    }

    /// Whether the context is still running and no termination signal has
    /// been received. Callers driving a wait loop should check this before
    /// scheduling further waits.
    pub fn ok(&self) -> bool {
        !signal_handler::is_halt() && *self.inner.state.lock() == Lifecycle::Running
    }

    /// Shut the context down.
    ///
    /// The first call succeeds and triggers the registered shutdown guard
    /// conditions so blocked selectors wake up and can observe
    /// `ok() == false`. Further calls return [`Error::AlreadyShutdown`].
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                Lifecycle::Running => *state = Lifecycle::ShutDown,
                Lifecycle::ShutDown => return Err(Error::AlreadyShutdown),
            }
        }
        debug!("context shut down");
        signal_handler::notify_guards();
        Ok(())
    }

    /// Create a new node.
    ///
    /// # Arguments
    ///
    /// * `name` - Node name (single token, validated)
    /// * `namespace` - Optional absolute namespace (validated)
    pub fn create_node(&self, name: &str, namespace: Option<&str>) -> Result<Arc<Node>> {
        self.ensure_running()?;
        names::validate_node_name(name)?;
        if let Some(ns) = namespace
            && !ns.is_empty()
        {
            names::validate_namespace(ns)?;
        }
        Node::new(self.clone(), name, namespace.unwrap_or(""))
    }

    /// Create a selector for single-threaded event-driven execution.
    pub fn create_selector(&self) -> Result<Selector> {
        self.ensure_running()?;
        Selector::new(self.clone())
    }

    /// Create a wait set with the given per-category capacities.
    pub fn create_wait_set(&self, capacities: Capacities) -> Result<WaitSet> {
        self.ensure_running()?;
        Ok(WaitSet::new(self.transport().clone(), capacities))
    }

    /// Create a node-independent guard condition.
    pub fn create_guard_condition(&self) -> Result<GuardCondition> {
        self.ensure_running()?;
        GuardCondition::new(self.transport().clone())
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub(crate) fn is_same(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_running(&self) -> Result<()> {
        if signal_handler::is_halt() {
            return Err(Error::Signaled);
        }
        match *self.inner.state.lock() {
            Lifecycle::Running => Ok(()),
            Lifecycle::ShutDown => Err(Error::AlreadyShutdown),
        }
    }
}
