//! Process-wide halt flag and signal-driven wakeups.
//!
//! SIGINT/SIGTERM set a halt flag and trigger every registered guard
//! condition so that blocked [`crate::WaitSet::wait`] calls observe the
//! shutdown instead of sleeping through it. Selectors register their signal
//! guard condition here on construction and unregister it on drop.

use crate::selector::guard_condition::GuardCondition;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};
use tracing::warn;

static HALT: AtomicBool = AtomicBool::new(false);
static GUARDS: Lazy<Mutex<Vec<GuardCondition>>> = Lazy::new(|| Mutex::new(Vec::new()));
static HOOK: OnceLock<()> = OnceLock::new();

/// Whether the process has received a termination signal.
pub fn is_halt() -> bool {
    HALT.load(Ordering::Relaxed)
}

/// Trigger every registered guard condition, waking blocked waits.
pub(crate) fn notify_guards() {
    let guards = GUARDS.lock();
    for guard in guards.iter() {
        if let Err(e) = guard.trigger() {
            warn!("failed to trigger shutdown guard condition: {e}");
        }
    }
}

pub(crate) fn register_guard_condition(cond: GuardCondition) {
    install_hook();
    GUARDS.lock().push(cond);
}

pub(crate) fn unregister_guard_condition(cond: &GuardCondition) {
    GUARDS.lock().retain(|g| g.raw() != cond.raw());
}

/// Install the signal watcher once per process.
pub(crate) fn install_hook() {
    HOOK.get_or_init(|| {
        use signal_hook::{
            consts::{SIGINT, SIGTERM},
            iterator::Signals,
        };

        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(e) => {
                warn!("failed to register signal handlers: {e}");
                return;
            }
        };

        std::thread::Builder::new()
            .name("rolink-signals".into())
            .spawn(move || {
                for _signal in signals.forever() {
                    HALT.store(true, Ordering::Relaxed);
                    notify_guards();
                }
            })
            .ok();
    });
}
