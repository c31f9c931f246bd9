//! Integration tests for the rack command pipeline

mod config_layers;
mod test_utils;

pub use test_utils::{run, with_config_env, MemoryStorage};
