use crate::obs::sink::{self, MetricsEvent};
use std::cell::Cell;

// One flag per thread, shared by every `ThreadLocalSession` in the process.
thread_local! {
    static SESSION_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

///
/// HostSession
///
/// Per-thread host environment the caller's handler runs inside.
/// `ensure_active` is idempotent and cheap after the first call on a thread.
///

pub trait HostSession: Sync {
    fn ensure_active(&self);
}

///
/// ThreadLocalSession
///
/// Marks each thread as initialized the first time a result is delivered
/// on it and never tears the session down.
///
/// The host session is process-wide: once any instance has initialized a
/// thread, no other instance runs its `init` on that thread.
///

pub struct ThreadLocalSession {
    init: Box<dyn Fn() + Send + Sync>,
}

impl ThreadLocalSession {
    /// Session that runs `init` once per thread before the first delivery.
    #[must_use]
    pub fn new(init: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            init: Box::new(init),
        }
    }

    /// Whether the calling thread already has an active session.
    #[must_use]
    pub fn is_active() -> bool {
        SESSION_ACTIVE.with(Cell::get)
    }
}

impl Default for ThreadLocalSession {
    fn default() -> Self {
        Self::new(|| {})
    }
}

impl HostSession for ThreadLocalSession {
    fn ensure_active(&self) {
        SESSION_ACTIVE.with(|active| {
            if active.get() {
                return;
            }

            (self.init)();
            active.set(true);

            sink::record(MetricsEvent::SessionInitialized);
            tracing::debug!(thread = ?std::thread::current().id(), "host session initialized");
        });
    }
}
