//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
/// Later sources (global file, explicit file, environment) override these in that order.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("output.format", "table")?
        .set_default("output.header", true)?
        .set_default("batch.workers", 4)?
        .set_default("batch.on_decode_error", "abort")?
        .set_default("service.timeout_secs", 30)?
        .set_default("service.poll_interval_secs", 2)
}
