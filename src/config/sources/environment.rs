//! Environment source: RACK_<SECTION>__<KEY> variables, plus RS_REGION_NAME for the region.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const PREFIX: &str = "RACK";
pub const REGION_VAR: &str = "RS_REGION_NAME";

/// Add environment overrides to builder. `RS_REGION_NAME` only fills `service.region` when no
/// file or `RACK_SERVICE__REGION` sets it.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = match std::env::var(REGION_VAR) {
        Ok(region) if !region.is_empty() => builder.set_default("service.region", region)?,
        _ => builder,
    };
    Ok(builder.add_source(
        Environment::with_prefix(PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    ))
}
