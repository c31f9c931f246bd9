//! Rack: a command-line framework for a cloud provider's APIs.
//!
//! Every command runs through one pipeline: validate flags, resolve input items from flags
//! or standard input, execute items with bounded concurrency, and render results in input
//! order as a table, JSON, or a single-field projection.

pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod input;
pub mod logging;
pub mod render;
pub mod resource;
pub mod service;
pub mod validate;
