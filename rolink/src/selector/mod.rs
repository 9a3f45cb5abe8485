//! Selector provides `select`/`epoll`-like multiplexing over entities.
//!
//! A selector owns the clear/populate/wait/drain cycle of an internal
//! [`WaitSet`] and invokes the callback registered for each entity that a
//! cycle reports ready. This is the primary mechanism for single-threaded
//! event-driven execution; a selector can neither be sent to another thread
//! nor shared between threads.
//!
//! # Example
//!
//! ```ignore
//! let ctx = Context::new(transport)?;
//! let node = ctx.create_node("listener", None)?;
//! let subscriber = node.create_subscriber::<MyMsg>("chatter", None)?;
//!
//! let mut selector = ctx.create_selector()?;
//! selector.add_subscriber(subscriber, Box::new(|msg| {
//!     println!("received: {msg:?}");
//! }));
//!
//! loop {
//!     selector.wait()?;
//! }
//! ```

pub mod guard_condition;

use self::guard_condition::{GuardCondition, GuardData};
use crate::{
    PhantomUnsend, PhantomUnsync,
    context::Context,
    service::{client::ClientData, client::ClientRecv, server::Server},
    signal_handler,
    topic::subscriber::{Subscriber, SubscriberData},
    wait_set::{Capacities, Timeout, WaitResult, WaitSet},
};
use rolink_core::{
    entity::{EntityKind, RawEntity, WaitHandle},
    error::{Error, RecvResult, Result},
    msg::{ServiceMsg, TypeSupport},
    selector::{CallbackResult, ConditionHandler},
};
use std::{
    collections::{BTreeMap, BTreeSet, BinaryHeap},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, trace};

/// Budget for draining one ready entity before yielding to the others, so a
/// flooded topic cannot starve the rest of the cycle.
const DRAIN_BUDGET: Duration = Duration::from_millis(1);

struct TimerEntry {
    deadline: Instant,
    id: u64,
    name: Option<String>,
    /// `Some(period)` reloads the timer after each fire.
    period: Option<Duration>,
    handler: Option<Box<dyn FnMut() -> CallbackResult>>,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    // reversed: BinaryHeap is a max-heap, we want the nearest deadline on top
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Selector invoking callback functions associated with subscriptions,
/// servers, clients, guard conditions, and timers.
pub struct Selector {
    context: Context,
    wait_set: WaitSet,
    signal_cond: GuardCondition,
    subscriptions: BTreeMap<RawEntity, ConditionHandler<Arc<SubscriberData>>>,
    clients: BTreeMap<RawEntity, ConditionHandler<Arc<ClientData>>>,
    services: BTreeMap<RawEntity, ConditionHandler<Arc<crate::service::server::ServerData>>>,
    conds: BTreeMap<RawEntity, ConditionHandler<Arc<GuardData>>>,
    timers: BinaryHeap<TimerEntry>,
    live_timers: BTreeSet<u64>,
    next_timer_id: u64,
    _unused: (PhantomUnsync, PhantomUnsend),
}

impl Selector {
    pub(crate) fn new(context: Context) -> Result<Self> {
        let signal_cond = GuardCondition::new(context.transport().clone())?;

        let wait_set = WaitSet::new(
            context.transport().clone(),
            Capacities {
                guard_conditions: 1,
                ..Default::default()
            },
        );

        let mut selector = Selector {
            context,
            wait_set,
            signal_cond: signal_cond.clone(),
            subscriptions: Default::default(),
            clients: Default::default(),
            services: Default::default(),
            conds: Default::default(),
            timers: BinaryHeap::new(),
            live_timers: BTreeSet::new(),
            next_timer_id: 0,
            _unused: (Default::default(), Default::default()),
        };

        selector.insert_guard(&signal_cond, None, false);
        signal_handler::register_guard_condition(signal_cond);

        Ok(selector)
    }

    /// Register a subscriber with a callback invoked per arriving message.
    ///
    /// Returns `false` (and registers nothing) if the subscriber belongs to
    /// a different context.
    pub fn add_subscriber<T: TypeSupport>(
        &mut self,
        subscriber: Subscriber<T>,
        mut handler: Box<dyn FnMut(T)>,
    ) -> bool {
        if !self.context.is_same(subscriber.data.node.context()) {
            return false;
        }
        let data = subscriber.data.clone();

        let f = move || {
            let start = Instant::now();
            loop {
                match subscriber.try_recv() {
                    RecvResult::Ok(msg) => handler(msg),
                    RecvResult::RetryLater => return CallbackResult::Ok,
                    RecvResult::Err(e) => {
                        error!("failed try_recv() of subscriber: {e}");
                        return CallbackResult::Remove;
                    }
                }
                if start.elapsed() > DRAIN_BUDGET {
                    return CallbackResult::Ok;
                }
            }
        };

        self.subscriptions.insert(
            data.raw,
            ConditionHandler {
                event: data,
                handler: Some(Box::new(f)),
                is_once: false,
            },
        );
        true
    }

    /// Register a server with a callback computing the response for each
    /// request. Responses are sent back automatically.
    ///
    /// Returns `false` (and registers nothing) if the server belongs to a
    /// different context.
    pub fn add_server<T: ServiceMsg>(
        &mut self,
        server: Server<T>,
        mut handler: Box<dyn FnMut(T::Request, crate::service::Header) -> T::Response>,
    ) -> bool {
        if !self.context.is_same(server.data.node.context()) {
            return false;
        }
        let data = server.data.clone();

        let f = move || {
            let start = Instant::now();
            loop {
                match server.try_recv() {
                    RecvResult::Ok((sender, request, header)) => {
                        let response = handler(request, header);
                        if let Err(e) = sender.send(&response) {
                            error!("failed to send response from server: {e}");
                            return CallbackResult::Ok;
                        }
                    }
                    RecvResult::RetryLater => return CallbackResult::Ok,
                    RecvResult::Err(e) => {
                        error!("failed try_recv() of server: {e}");
                        return CallbackResult::Remove;
                    }
                }
                if start.elapsed() > DRAIN_BUDGET {
                    return CallbackResult::Ok;
                }
            }
        };

        self.services.insert(
            data.raw,
            ConditionHandler {
                event: data,
                handler: Some(Box::new(f)),
                is_once: false,
            },
        );
        true
    }

    /// Wait for the response of one in-flight request.
    /// The registration is one-shot: after a ready cycle the client is
    /// removed again, so register anew for every retry.
    pub(crate) fn add_client_recv<T: ServiceMsg>(&mut self, recv: &ClientRecv<T>) {
        self.clients.insert(
            recv.data.raw,
            ConditionHandler {
                event: recv.data.clone(),
                handler: None,
                is_once: true,
            },
        );
    }

    /// Register a guard condition with an optional callback.
    pub fn add_guard_condition(
        &mut self,
        cond: &GuardCondition,
        handler: Option<Box<dyn FnMut() -> CallbackResult>>,
    ) {
        self.insert_guard(cond, handler, false);
    }

    fn insert_guard(
        &mut self,
        cond: &GuardCondition,
        handler: Option<Box<dyn FnMut() -> CallbackResult>>,
        is_once: bool,
    ) {
        self.conds.insert(
            cond.raw(),
            ConditionHandler {
                event: cond.data.clone(),
                handler,
                is_once,
            },
        );
    }

    /// Remove a registered guard condition.
    pub fn remove_guard_condition(&mut self, cond: &GuardCondition) {
        self.conds.remove(&cond.raw());
    }

    /// Add a one-shot timer. The handler is called once, `t` from now.
    ///
    /// Returns the timer id, usable with [`Selector::remove_timer`].
    pub fn add_timer(&mut self, t: Duration, mut handler: Box<dyn FnMut()>) -> u64 {
        self.add_timer_inner(
            t,
            None,
            None,
            Box::new(move || {
                handler();
                CallbackResult::Ok
            }),
        )
    }

    /// Add a wall timer firing every `period`, starting one period from now.
    ///
    /// Returns the timer id, usable with [`Selector::remove_timer`].
    pub fn add_wall_timer(
        &mut self,
        name: &str,
        period: Duration,
        mut handler: Box<dyn FnMut()>,
    ) -> u64 {
        self.add_timer_inner(
            period,
            Some(name.to_string()),
            Some(period),
            Box::new(move || {
                handler();
                CallbackResult::Ok
            }),
        )
    }

    fn add_timer_inner(
        &mut self,
        t: Duration,
        name: Option<String>,
        period: Option<Duration>,
        handler: Box<dyn FnMut() -> CallbackResult>,
    ) -> u64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        self.live_timers.insert(id);
        self.timers.push(TimerEntry {
            deadline: Instant::now() + t,
            id,
            name,
            period,
            handler: Some(handler),
        });
        id
    }

    /// Remove a timer by id.
    pub fn remove_timer(&mut self, id: u64) {
        self.live_timers.remove(&id);
    }

    /// Wait for events and invoke the registered callbacks.
    ///
    /// Returns once at least one event (entity readiness or timer expiry)
    /// has been dispatched, or with [`Error::Signaled`] on shutdown.
    pub fn wait(&mut self) -> Result<()> {
        self.wait_inner(None).map(|_| ())
    }

    /// Wait for events with a timeout.
    ///
    /// Returns `Ok(true)` if events were dispatched, `Ok(false)` if the
    /// timeout elapsed first.
    pub fn wait_timeout(&mut self, t: Duration) -> Result<bool> {
        self.wait_inner(Some(t))
    }

    fn wait_inner(&mut self, timeout: Option<Duration>) -> Result<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if signal_handler::is_halt() {
                return Err(Error::Signaled);
            }

            self.rebuild_wait_set()?;

            // the nearest timer deadline bounds the wait
            let mut bound = deadline;
            if let Some(timer_deadline) = self.next_timer_deadline() {
                bound = Some(bound.map_or(timer_deadline, |d| d.min(timer_deadline)));
            }

            let now = Instant::now();
            let wait_timeout = match bound {
                None => Timeout::Forever,
                Some(b) if b <= now => Timeout::Immediate,
                Some(b) => Timeout::After(b - now),
            };

            let result = self.wait_set.wait(wait_timeout)?;

            if signal_handler::is_halt() {
                return Err(Error::Signaled);
            }

            let fired = self.fire_timers();
            let ready = matches!(result, WaitResult::Ready(_));
            if ready {
                self.notify();
            }
            if ready || fired > 0 {
                return Ok(true);
            }
            if let Some(d) = deadline
                && Instant::now() >= d
            {
                return Ok(false);
            }
            // a removed timer's stale deadline expired; take another cycle
        }
    }

    /// Clear and repopulate the internal wait set from the registrations.
    /// Registrations outgrowing the fixed capacities require a new set.
    fn rebuild_wait_set(&mut self) -> Result<()> {
        let needed = Capacities {
            subscriptions: self.subscriptions.len(),
            guard_conditions: self.conds.len(),
            timers: 0,
            clients: self.clients.len(),
            services: self.services.len(),
        };

        if self.wait_set.capacities().fits(&needed) {
            self.wait_set.clear_all();
        } else {
            self.wait_set = WaitSet::new(self.context.transport().clone(), needed);
        }

        for raw in self.subscriptions.keys() {
            self.wait_set.add(WaitHandle {
                kind: EntityKind::Subscription,
                raw: *raw,
            })?;
        }
        for raw in self.conds.keys() {
            self.wait_set.add(WaitHandle {
                kind: EntityKind::GuardCondition,
                raw: *raw,
            })?;
        }
        for raw in self.clients.keys() {
            self.wait_set.add(WaitHandle {
                kind: EntityKind::ServiceClient,
                raw: *raw,
            })?;
        }
        for raw in self.services.keys() {
            self.wait_set.add(WaitHandle {
                kind: EntityKind::ServiceServer,
                raw: *raw,
            })?;
        }
        Ok(())
    }

    fn next_timer_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.timers.peek() {
            if self.live_timers.contains(&entry.id) {
                return Some(entry.deadline);
            }
            self.timers.pop();
        }
        None
    }

    /// Run every timer whose deadline has passed; reload wall timers.
    fn fire_timers(&mut self) -> usize {
        let now = Instant::now();
        let mut fired = 0;
        let mut reload = Vec::new();

        while let Some(entry) = self.timers.peek() {
            if entry.deadline > now {
                break;
            }
            let Some(mut entry) = self.timers.pop() else {
                break;
            };
            if !self.live_timers.contains(&entry.id) {
                continue;
            }
            if let Some(mut handler) = entry.handler.take() {
                handler();
                fired += 1;
                if let Some(period) = entry.period {
                    if let Some(name) = &entry.name {
                        trace!(timer = %name, "wall timer fired");
                    }
                    // keep the cadence unless we fell more than a period behind
                    let next = entry.deadline + period;
                    entry.deadline = if next > now { next } else { now + period };
                    entry.handler = Some(handler);
                    reload.push(entry);
                } else {
                    self.live_timers.remove(&entry.id);
                }
            }
        }

        for entry in reload {
            self.timers.push(entry);
        }
        fired
    }

    /// Invoke the callbacks of every entity the finished cycle left ready.
    fn notify(&mut self) {
        Self::notify_category(
            &mut self.subscriptions,
            &self.wait_set,
            EntityKind::Subscription,
        );
        Self::notify_category(&mut self.conds, &self.wait_set, EntityKind::GuardCondition);
        Self::notify_category(&mut self.clients, &self.wait_set, EntityKind::ServiceClient);
        Self::notify_category(&mut self.services, &self.wait_set, EntityKind::ServiceServer);
    }

    fn notify_category<E>(
        registrations: &mut BTreeMap<RawEntity, ConditionHandler<E>>,
        wait_set: &WaitSet,
        kind: EntityKind,
    ) {
        for handle in wait_set.ready(kind) {
            let mut remove = false;
            if let Some(registration) = registrations.get_mut(&handle.raw) {
                if let Some(handler) = &mut registration.handler
                    && handler() == CallbackResult::Remove
                {
                    remove = true;
                }
                if registration.is_once || remove {
                    registrations.remove(&handle.raw);
                }
            }
        }
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        signal_handler::unregister_guard_condition(&self.signal_cond);
    }
}
