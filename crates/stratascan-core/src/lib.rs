//! Core runtime for stratascan: loosely-typed values, request assembly,
//! predicate validation, the execution-layer seam, and result delivery.
#![warn(unreachable_pub)]

// configuration lives in its own crate so tooling can load it without the runtime
pub use stratascan_config as config;

// public exports are one module level down
pub mod bridge;
pub mod convert;
pub mod executor;
pub mod native;
pub mod obs;
pub mod query;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only. No errors, executors or sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        native::{Filter, IndexType, QueryRequest, ScanRequest},
        query::{RequestBuilder, RequestDescriptor, predicate::Predicate},
        value::Value,
    };
}
