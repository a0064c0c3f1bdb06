use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
///
/// Process-wide, in-memory counters. Callbacks arrive on executor worker
/// threads, so the state is global rather than thread-local.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub requests: BTreeMap<String, RequestCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            requests: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Request assembly
    pub requests_built: u64,
    pub requests_rejected: u64,

    // Result delivery
    pub results_delivered: u64,
    pub handler_stops: u64,
    pub streams_finished: u64,
    pub conversion_failures: u64,
    pub aggregate_values_filtered: u64,

    // Host sessions
    pub sessions_initialized: u64,
}

///
/// RequestCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestCounters {
    pub built: u64,
    pub rejected: u64,
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// `None` when the requested window starts after the current one.
    pub counters: Option<EventState>,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    f(&EVENT_STATE.lock())
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    f(&mut EVENT_STATE.lock())
}

/// Reset all counters and start a new window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot the counters if the current window started at or after `window_start_ms`.
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    with_state(|m| {
        let include = window_start_ms.is_none_or(|start| start <= m.window_start_ms);

        EventReport {
            counters: include.then(|| m.clone()),
        }
    })
}
