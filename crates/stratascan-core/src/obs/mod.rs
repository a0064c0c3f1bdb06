//! Observability: runtime counters and the sink they flow through.
//!
//! Request assembly and the callback bridge never touch `metrics` directly.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, RequestCounters};
pub use sink::{
    MetricsEvent, MetricsSink, RequestKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
