//! Runtime configuration for stratascan clients.
//!
//! Every section has a default, so an empty document is a valid config.
//! Policies defined here are copied onto each request the builder produces.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;


///
/// CONSTANTS
///

/// Default number of execution-layer worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on execution-layer worker threads.
pub const MAX_WORKERS: usize = 256;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("scan.percent must be between 1 and 100, got {0}")]
    ScanPercent(u8),

    #[error("executor.workers must be between 1 and {MAX_WORKERS}, got {0}")]
    Workers(usize),
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub client: ClientConfig,
    pub scan: ScanPolicy,
    pub query: QueryPolicy,
    pub executor: ExecutorConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.percent == 0 || self.scan.percent > 100 {
            return Err(ConfigError::ScanPercent(self.scan.percent));
        }
        if self.executor.workers == 0 || self.executor.workers > MAX_WORKERS {
            return Err(ConfigError::Workers(self.executor.workers));
        }

        Ok(())
    }
}

///
/// ClientConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub serializer: Serializer,
}

///
/// Serializer
///
/// How host values without a native counterpart (booleans) are shipped.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Serializer {
    /// Reject values the server cannot store natively.
    #[default]
    None,

    /// Encode them as JSON-tagged bytes.
    Json,
}

///
/// ScanPriority
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPriority {
    #[default]
    Auto,
    Low,
    Medium,
    High,
}

///
/// ScanPolicy
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanPolicy {
    /// Percentage of each partition to visit, 1..=100.
    pub percent: u8,
    pub priority: ScanPriority,
    /// Scan nodes in parallel rather than one after another.
    pub concurrent: bool,
    /// Return record metadata only.
    pub no_bins: bool,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            percent: 100,
            priority: ScanPriority::Auto,
            concurrent: false,
            no_bins: false,
        }
    }
}

///
/// QueryPolicy
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryPolicy {
    /// Execution-layer timeout; zero disables it.
    pub timeout_ms: u32,
}

///
/// ExecutorConfig
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    pub workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}
