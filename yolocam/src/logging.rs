//! Structured logging on top of [`env_tracing_logger`], plus the fatal-error
//! counter that trips an OS reboot after 25 ERROR-kind events.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::field;

/// Category carried as a `tracing` field (`kind`) on every event so that the
/// on-disk log, the `<GET_LOG_MESSAGES>` control command, and the fatal-error
/// counter all observe the same structured value instead of parsing message
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Debug,
    Decision,
    Network,
    Warning,
    Error,
}

impl EventKind {
    fn as_str(self) -> &'static str {
        match self {
            EventKind::Debug => "DEBUG",
            EventKind::Decision => "DECISION",
            EventKind::Network => "NETWORK",
            EventKind::Warning => "WARNING",
            EventKind::Error => "ERROR",
        }
    }
}

/// Number of consecutive-or-not ERROR events observed since the last reboot
/// or since the hourly housekeeper tick cleared the counter.
pub static FATAL_ERROR_COUNT: AtomicU32 = AtomicU32::new(0);

/// Threshold at which the housekeeper should persist state and reboot.
pub const FATAL_ERROR_THRESHOLD: u32 = 25;

/// Emit a structured log event tagged with `kind`, bumping the fatal counter
/// on [`EventKind::Error`].
pub fn log_event(kind: EventKind, message: &str) {
    match kind {
        EventKind::Debug => tracing::debug!(kind = field::display(kind.as_str()), "{message}"),
        EventKind::Decision => tracing::info!(kind = field::display(kind.as_str()), "{message}"),
        EventKind::Network => tracing::warn!(kind = field::display(kind.as_str()), "{message}"),
        EventKind::Warning => tracing::warn!(kind = field::display(kind.as_str()), "{message}"),
        EventKind::Error => {
            tracing::error!(kind = field::display(kind.as_str()), "{message}");
            FATAL_ERROR_COUNT.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// True once the fatal counter has crossed [`FATAL_ERROR_THRESHOLD`].
pub fn fatal_threshold_reached() -> bool {
    FATAL_ERROR_COUNT.load(Ordering::SeqCst) >= FATAL_ERROR_THRESHOLD
}

/// Reset the fatal counter; called by the hourly housekeeper tick.
pub fn reset_fatal_counter() {
    FATAL_ERROR_COUNT.store(0, Ordering::SeqCst);
}

/// Initialize the process-wide subscriber. Returns a guard that should be
/// held for the lifetime of the process (dropping it flushes any buffered
/// writers).
pub fn init() -> impl Drop {
    env_tracing_logger::init()
}
