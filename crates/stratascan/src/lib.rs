//! ## Crate layout
//! - `config`: TOML configuration for the client, policies and executor.
//! - `core`: values, request assembly, predicates, the executor seam and the callback bridge.
//! - `error`: the public error taxonomy.
//!
//! `Client` is the entry point: it turns a `RequestDescriptor` into a native
//! request, runs it, and delivers results to the caller's handler.

pub use stratascan_config as config;
pub use stratascan_core as core;

mod client;
pub mod error;

pub use client::Client;
pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Client, Error,
        config::Config,
        core::{
            executor::{Executor as _, MemoryExecutor},
            prelude::*,
        },
    };
}
