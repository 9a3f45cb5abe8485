//! Manually triggerable wakeup conditions.

use rolink_core::{
    entity::{EntityKind, RawEntity, WaitHandle},
    error::Result,
    transport::Transport,
};
use std::sync::Arc;
use tracing::warn;

pub(crate) struct GuardData {
    pub(crate) raw: RawEntity,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Drop for GuardData {
    fn drop(&mut self) {
        if let Err(e) = self.transport.destroy_guard_condition(self.raw) {
            warn!("failed to destroy guard condition: {e}");
        }
    }
}

/// A condition that can be triggered from any thread to wake a blocked wait.
///
/// Triggers are consumed by the wait cycle that observes them: after a wait
/// reports the condition ready, it is not ready again until re-triggered.
#[derive(Clone)]
pub struct GuardCondition {
    pub(crate) data: Arc<GuardData>,
}

impl GuardCondition {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        let raw = transport.create_guard_condition()?;
        Ok(GuardCondition {
            data: Arc::new(GuardData { raw, transport }),
        })
    }

    /// Mark the condition ready and wake every wait blocked on it.
    pub fn trigger(&self) -> Result<()> {
        self.data.transport.trigger_guard_condition(self.data.raw)
    }

    /// Non-owning reference for wait-set registration.
    pub fn handle(&self) -> WaitHandle {
        WaitHandle {
            kind: EntityKind::GuardCondition,
            raw: self.data.raw,
        }
    }

    pub(crate) fn raw(&self) -> RawEntity {
        self.data.raw
    }
}
