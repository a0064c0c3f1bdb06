//! Metrics sink boundary.
//!
//! Request assembly and result delivery never write `obs::metrics` directly.
//! Every counter moves through `MetricsEvent` and `MetricsSink`.
use crate::obs::metrics;
use derive_more::Display;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// RequestKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum RequestKind {
    #[display("scan")]
    Scan,
    #[display("query")]
    Query,
    #[display("background_scan")]
    BackgroundScan,
    #[display("aggregate")]
    Aggregate,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    RequestBuilt { kind: RequestKind },
    BuildRejected { kind: RequestKind },
    ResultDelivered,
    HandlerStopped,
    StreamFinished,
    ConversionFailed,
    AggregateValueFiltered,
    SessionInitialized,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the process-wide metrics state.
/// Used whenever no scoped override is installed on the current thread.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::RequestBuilt { kind } => {
                m.ops.requests_built = m.ops.requests_built.saturating_add(1);
                let entry = m.requests.entry(kind.to_string()).or_default();
                entry.built = entry.built.saturating_add(1);
            }
            MetricsEvent::BuildRejected { kind } => {
                m.ops.requests_rejected = m.ops.requests_rejected.saturating_add(1);
                let entry = m.requests.entry(kind.to_string()).or_default();
                entry.rejected = entry.rejected.saturating_add(1);
            }
            MetricsEvent::ResultDelivered => {
                m.ops.results_delivered = m.ops.results_delivered.saturating_add(1);
            }
            MetricsEvent::HandlerStopped => {
                m.ops.handler_stops = m.ops.handler_stops.saturating_add(1);
            }
            MetricsEvent::StreamFinished => {
                m.ops.streams_finished = m.ops.streams_finished.saturating_add(1);
            }
            MetricsEvent::ConversionFailed => {
                m.ops.conversion_failures = m.ops.conversion_failures.saturating_add(1);
            }
            MetricsEvent::AggregateValueFiltered => {
                m.ops.aggregate_values_filtered =
                    m.ops.aggregate_values_filtered.saturating_add(1);
            }
            MetricsEvent::SessionInitialized => {
                m.ops.sessions_initialized = m.ops.sessions_initialized.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` comes from a live `&dyn MetricsSink` installed by `with_metrics_sink`,
        //   which restores the previous slot on every exit, unwinding included.
        // - The slot is thread-local and `record` uses the pointer synchronously,
        //   so it never outlives the borrow it was made from.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by the start of the current counting window,
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state and open a new window.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink for the current thread.
///
/// Events raised on other threads (executor workers) still reach the global sink.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The erased pointer is only reachable through this thread's slot while
    //   `f` runs; `Guard` puts the previous value back on all exits.
    // - Only shared access is ever materialized from it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink<'a> {
        calls: &'a AtomicUsize,
    }

    impl MetricsSink for CountingSink<'_> {
        fn record(&self, _: MetricsEvent) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        let outer_calls = AtomicUsize::new(0);
        let inner_calls = AtomicUsize::new(0);
        let outer = CountingSink {
            calls: &outer_calls,
        };
        let inner = CountingSink {
            calls: &inner_calls,
        };

        with_metrics_sink(&outer, || {
            record(MetricsEvent::ResultDelivered);

            with_metrics_sink(&inner, || {
                record(MetricsEvent::HandlerStopped);
            });

            record(MetricsEvent::StreamFinished);
        });

        assert_eq!(outer_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        let calls = AtomicUsize::new(0);
        let sink = CountingSink { calls: &calls };

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(&sink, || {
                record(MetricsEvent::ConversionFailed);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    // Other tests write to the global state concurrently, so only lower
    // bounds are stable here.
    #[test]
    fn global_sink_counts_per_request_kind() {
        record(MetricsEvent::RequestBuilt {
            kind: RequestKind::Aggregate,
        });
        record(MetricsEvent::BuildRejected {
            kind: RequestKind::Aggregate,
        });

        let counters = metrics_report(None)
            .counters
            .expect("report without window start should include counters");
        let aggregate = counters
            .requests
            .get("aggregate")
            .expect("aggregate counters should be present");

        assert!(aggregate.built >= 1);
        assert!(aggregate.rejected >= 1);
        assert!(counters.ops.requests_built >= 1);
    }

    #[test]
    fn window_start_after_current_window_returns_nothing() {
        let window_start = metrics::with_state(|m| m.window_start_ms);

        let report = metrics_report(Some(window_start.saturating_add(60_000)));

        assert!(report.counters.is_none());
    }
}
