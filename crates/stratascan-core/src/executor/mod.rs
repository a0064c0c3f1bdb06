//! Module: executor
//! Responsibility: the execution-layer seam requests are handed to.
//! Does not own: request validation (see `query`) or result decoding (see `bridge`).
//! Boundary: results flow back only through the per-result callback.

mod memory;

#[cfg(test)]
mod tests;

pub use memory::{AggregateUdf, MemoryExecutor, RecordUdf};

use crate::native::{NativeValue, QueryRequest, ScanRequest, Status};
use derive_more::Display;
use thiserror::Error as ThisError;

/// Per-result callback. `None` marks the end of the stream.
/// Returning `false` asks the execution layer to stop.
pub type ResultCallback<'a> = dyn Fn(Option<&NativeValue>) -> bool + Sync + 'a;

///
/// NativeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message} ({status})")]
pub struct NativeError {
    pub status: Status,
    pub message: String,
}

impl NativeError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

///
/// ScanStatus
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ScanStatus {
    #[display("AS_SCAN_STATUS_UNDEF")]
    Undefined,
    #[display("AS_SCAN_STATUS_INPROGRESS")]
    InProgress,
    #[display("AS_SCAN_STATUS_ABORTED")]
    Aborted,
    #[display("AS_SCAN_STATUS_COMPLETED")]
    Completed,
}

///
/// ScanInfo
///
/// Progress of a background scan job.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanInfo {
    pub status: ScanStatus,
    pub progress_pct: u8,
    pub records_scanned: u64,
}

///
/// Executor
///
/// Native execution layer. Callbacks may arrive on any thread and in any
/// order; implementations must stop promptly once a callback returns `false`
/// and must not send the end-of-stream signal after that.
///

pub trait Executor: Sync {
    fn scan_foreach(
        &self,
        request: &ScanRequest,
        callback: &ResultCallback<'_>,
    ) -> Result<(), NativeError>;

    /// Runs the query; when the request carries a UDF the callback receives
    /// aggregate values instead of records.
    fn query_foreach(
        &self,
        request: &QueryRequest,
        callback: &ResultCallback<'_>,
    ) -> Result<(), NativeError>;

    /// Start a background scan and return its job id.
    fn scan_background(&self, request: &ScanRequest) -> Result<u64, NativeError>;

    fn scan_info(&self, scan_id: u64) -> Result<ScanInfo, NativeError>;
}
