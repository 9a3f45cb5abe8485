//! Fixed-capacity wait set: the single blocking readiness primitive.
//!
//! A wait set holds one array of entity slots per category, sized exactly
//! once at construction. Each cycle the caller clears the arrays, populates
//! them with the entities of interest, blocks in [`WaitSet::wait`], and then
//! drains the surviving entries: after a wait returns, a slot that is still
//! populated means "the entity placed there is ready", and a slot forced to
//! empty means "not ready". The arrays are mutated in place rather than
//! returning a side bitmap, so draining hands back the original entity
//! handles at their original indices.
//!
//! The caller must guarantee that no referenced entity is finalized while a
//! wait may still observe it; the slots are non-owning.

use crate::signal_handler;
use rolink_core::{
    entity::{EntityKind, WaitHandle},
    error::{Error, Result},
    transport::Transport,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Per-category slot counts, fixed at construction.
///
/// The `timers` category is reserved storage: selectors drive timers by
/// deadline arithmetic and never register them with the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacities {
    /// Subscription slots.
    pub subscriptions: usize,
    /// Guard-condition slots.
    pub guard_conditions: usize,
    /// Timer slots (reserved).
    pub timers: usize,
    /// Service-client slots.
    pub clients: usize,
    /// Service-server slots.
    pub services: usize,
}

impl Capacities {
    /// Whether every category of `self` can hold the counts in `needed`.
    pub fn fits(&self, needed: &Capacities) -> bool {
        self.subscriptions >= needed.subscriptions
            && self.guard_conditions >= needed.guard_conditions
            && self.timers >= needed.timers
            && self.clients >= needed.clients
            && self.services >= needed.services
    }
}

/// How long a wait may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Block until an entity becomes ready.
    Forever,
    /// Poll: report the current state and return immediately.
    Immediate,
    /// Block for at most this long.
    After(Duration),
}

/// Outcome of a wait. A timeout with nothing ready is a first-class
/// non-error result, distinct from real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// This many entities are ready; their slots survived in place.
    Ready(usize),
    /// The timeout elapsed with nothing ready; every slot is now empty.
    TimedOut,
}

/// A resizable-only-by-replacement aggregate of entity references.
///
/// # Example
///
/// ```ignore
/// let mut ws = ctx.create_wait_set(Capacities { subscriptions: 1, ..Default::default() })?;
/// ws.add(subscriber.handle())?;
/// match ws.wait(Timeout::After(Duration::from_millis(100)))? {
///     WaitResult::Ready(_) => {
///         for handle in ws.ready(EntityKind::Subscription) { /* take */ }
///     }
///     WaitResult::TimedOut => {}
/// }
/// ```
pub struct WaitSet {
    transport: Arc<dyn Transport>,
    capacities: Capacities,
    subscriptions: Vec<Option<WaitHandle>>,
    guard_conditions: Vec<Option<WaitHandle>>,
    timers: Vec<Option<WaitHandle>>,
    clients: Vec<Option<WaitHandle>>,
    services: Vec<Option<WaitHandle>>,
}

impl WaitSet {
    /// Allocate a wait set with exactly `capacities` slots per category.
    /// Capacities never grow; a larger set means constructing a new one.
    pub fn new(transport: Arc<dyn Transport>, capacities: Capacities) -> Self {
        WaitSet {
            transport,
            capacities,
            subscriptions: vec![None; capacities.subscriptions],
            guard_conditions: vec![None; capacities.guard_conditions],
            timers: vec![None; capacities.timers],
            clients: vec![None; capacities.clients],
            services: vec![None; capacities.services],
        }
    }

    /// The capacities this set was constructed with.
    pub fn capacities(&self) -> Capacities {
        self.capacities
    }

    fn category(&self, kind: EntityKind) -> &[Option<WaitHandle>] {
        match kind {
            EntityKind::Subscription => &self.subscriptions,
            EntityKind::GuardCondition => &self.guard_conditions,
            EntityKind::Timer => &self.timers,
            EntityKind::ServiceClient => &self.clients,
            EntityKind::ServiceServer => &self.services,
            EntityKind::Node | EntityKind::Publisher => &[],
        }
    }

    fn category_mut(&mut self, kind: EntityKind) -> Result<&mut Vec<Option<WaitHandle>>> {
        match kind {
            EntityKind::Subscription => Ok(&mut self.subscriptions),
            EntityKind::GuardCondition => Ok(&mut self.guard_conditions),
            EntityKind::Timer => Ok(&mut self.timers),
            EntityKind::ServiceClient => Ok(&mut self.clients),
            EntityKind::ServiceServer => Ok(&mut self.services),
            EntityKind::Node | EntityKind::Publisher => Err(Error::UnsupportedWaitKind(kind)),
        }
    }

    /// Reset every slot of one category to empty. Capacity is unchanged.
    /// Clearing an empty category is a no-op.
    pub fn clear(&mut self, kind: EntityKind) -> Result<()> {
        for slot in self.category_mut(kind)?.iter_mut() {
            *slot = None;
        }
        Ok(())
    }

    /// Reset every slot of every category. Call before repopulating for the
    /// next cycle so stale ready-state cannot leak into it.
    pub fn clear_all(&mut self) {
        for slots in [
            &mut self.subscriptions,
            &mut self.guard_conditions,
            &mut self.timers,
            &mut self.clients,
            &mut self.services,
        ] {
            for slot in slots.iter_mut() {
                *slot = None;
            }
        }
    }

    /// Place `handle` in the first empty slot of its category and return
    /// the slot index. A full category is a hard error, never silently
    /// tolerated.
    pub fn add(&mut self, handle: WaitHandle) -> Result<usize> {
        let kind = handle.kind;
        let slots = self.category_mut(kind)?;
        match slots.iter_mut().enumerate().find(|(_, slot)| slot.is_none()) {
            Some((index, slot)) => {
                *slot = Some(handle);
                Ok(index)
            }
            None => Err(Error::WaitSetFull(kind)),
        }
    }

    /// Whether no slot in any category is populated.
    pub fn is_empty(&self) -> bool {
        [
            &self.subscriptions,
            &self.guard_conditions,
            &self.timers,
            &self.clients,
            &self.services,
        ]
        .into_iter()
        .all(|slots| slots.iter().all(Option::is_none))
    }

    /// Surviving (ready) entries of one category, in slot order.
    ///
    /// Until the next `clear`/`add`, repeated calls yield the identical
    /// ready set.
    pub fn ready(&self, kind: EntityKind) -> impl Iterator<Item = WaitHandle> + '_ {
        self.category(kind).iter().filter_map(|slot| *slot)
    }

    /// Block until any populated slot has pending data, the timeout
    /// elapses, or an error occurs.
    ///
    /// Timeout semantics: [`Timeout::Forever`] waits indefinitely,
    /// [`Timeout::Immediate`] polls, [`Timeout::After`] bounds the wait.
    /// Waiting on an entirely empty set is [`Error::WaitSetEmpty`]. A
    /// pending process signal aborts the wait with [`Error::Signaled`].
    pub fn wait(&mut self, timeout: Timeout) -> Result<WaitResult> {
        if self.is_empty() {
            return Err(Error::WaitSetEmpty);
        }

        #[derive(Clone, Copy)]
        enum Bound {
            Forever,
            Poll,
            Until(Instant),
        }
        let bound = match timeout {
            Timeout::Forever => Bound::Forever,
            Timeout::Immediate => Bound::Poll,
            Timeout::After(d) => Bound::Until(Instant::now() + d),
        };

        let mut cursor = self.transport.activity_cursor();
        loop {
            if signal_handler::is_halt() {
                return Err(Error::Signaled);
            }

            if self.any_ready() {
                let ready = self.sweep();
                if ready > 0 {
                    return Ok(WaitResult::Ready(ready));
                }
                // a competing consumer drained everything between the probe
                // and the sweep; the populated set is gone, so report the
                // cycle as empty rather than spinning on cleared slots
                return Ok(WaitResult::TimedOut);
            }

            match bound {
                Bound::Poll => {
                    let ready = self.sweep();
                    return Ok(if ready > 0 {
                        WaitResult::Ready(ready)
                    } else {
                        WaitResult::TimedOut
                    });
                }
                Bound::Until(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let ready = self.sweep();
                        return Ok(if ready > 0 {
                            WaitResult::Ready(ready)
                        } else {
                            WaitResult::TimedOut
                        });
                    }
                    cursor = self.transport.wait_activity(cursor, Some(deadline - now))?;
                }
                Bound::Forever => {
                    cursor = self.transport.wait_activity(cursor, None)?;
                }
            }
        }
    }

    /// Non-mutating probe: is any populated slot ready right now?
    fn any_ready(&self) -> bool {
        [
            &self.subscriptions,
            &self.guard_conditions,
            &self.timers,
            &self.clients,
            &self.services,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .any(|handle| self.transport.entity_ready(handle.kind, handle.raw))
    }

    /// Observe readiness once, forcing every not-ready slot to empty.
    /// Returns the number of surviving entries. Observing a ready guard
    /// condition consumes its trigger.
    fn sweep(&mut self) -> usize {
        let transport = self.transport.clone();
        let mut ready = 0;
        for slots in [
            &mut self.subscriptions,
            &mut self.guard_conditions,
            &mut self.timers,
            &mut self.clients,
            &mut self.services,
        ] {
            for slot in slots.iter_mut() {
                if let Some(handle) = *slot {
                    if transport.take_ready(handle.kind, handle.raw) {
                        ready += 1;
                    } else {
                        *slot = None;
                    }
                }
            }
        }
        ready
    }
}
