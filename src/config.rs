//! Configuration System
//!
//! Layered configuration for the rack CLI: built-in defaults, the global config file,
//! an explicit `--config` file, then `RACK_*` environment variables. Resolved once at
//! startup; global flags override individual values for a single run.

use crate::error::RackError;
use crate::input::DecodePolicy;
use crate::logging::LoggingConfig;
use crate::render::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod environment;
    pub mod global_file;
}

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RackConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Print the table header row
    #[serde(default = "default_true")]
    pub header: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            header: default_true(),
        }
    }
}

/// Batch execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum execution hooks in flight
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// What to do with malformed piped JSON records
    #[serde(default)]
    pub on_decode_error: DecodePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            on_decode_error: DecodePolicy::Abort,
        }
    }
}

/// Service client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Object-storage endpoint, including the tenant path
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Token sent as `X-Auth-Token`
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Interval between status polls for commands that wait
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            auth_token: None,
            region: None,
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    2
}

impl RackConfig {
    /// Validate values the type system cannot express.
    pub fn validate(&self) -> Result<(), RackError> {
        if self.batch.workers == 0 {
            return Err(RackError::Config(
                "batch.workers must be at least 1".to_string(),
            ));
        }
        if self.service.timeout_secs == 0 {
            return Err(RackError::Config(
                "service.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads [`RackConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, the global file, an optional explicit file, and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<RackConfig, RackError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RackError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        builder = sources::environment::add_to_builder(builder)?;
        let config: RackConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<RackConfig, RackError> {
        let config: RackConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
