//! Logging integration using tracing.
//!
//! Sets up a `tracing` subscriber writing to stderr and a bridge that
//! forwards `log`-crate records into tracing. Call once at startup; later
//! calls are ignored.
//!
//! # Example
//!
//! ```ignore
//! use rolink::logger::init_logging;
//! use tracing::{info, warn};
//!
//! init_logging("my_node");
//! info!("node started");
//! warn!("something unexpected");
//! ```

use std::sync::OnceLock;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging. `name` identifies the process in the first record.
///
/// The filter is taken from `RUST_LOG`, defaulting to `info`. Idempotent:
/// calling again has no effect.
pub fn init_logging(name: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        // log -> tracing bridge
        tracing_log::LogTracer::init().ok();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .ok();

        debug!(logger = name, "logging initialized");
    });
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug as pr_debug, error as pr_error, info as pr_info, warn as pr_warn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging("test_node");
        init_logging("test_node_2");
    }

    #[test]
    fn macros_do_not_panic() {
        init_logging("test_macros");
        let value = 42;
        pr_info!(value, "message with field");
        pr_warn!("formatted: {value}");
    }
}
