//! CLI parse: the global flags and the clap command tree built from the registry.

use crate::cli::help::{leaf_matches, LEAF_HELP_TEMPLATE};
use crate::commands::ServiceGroup;
use crate::error::{RackError, ValidationError};
use crate::input::DecodePolicy;
use crate::render::OutputFormat;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use std::path::PathBuf;

/// Flags accepted by every command, before or after the subcommand path.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Output format
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Comma-separated output fields; a single field prints raw values
    #[arg(long, global = true, value_delimiter = ',', value_name = "FIELD[,FIELD...]")]
    pub fields: Vec<String>,

    /// Omit the table header row
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Read input items from standard input: a field name (one value per line) or `json`
    #[arg(long, global = true, value_name = "FIELD|json")]
    pub stdin: Option<String>,

    /// Maximum concurrent requests for piped batches
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// What to do with malformed piped JSON records
    #[arg(long, global = true, value_enum)]
    pub on_decode_error: Option<DecodePolicy>,

    /// Seconds between status polls for commands that wait
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging to standard error
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Write logs to this file instead of standard error
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Build `rack <service> <resource> <action>` from the registry.
pub fn build_cli(registry: &[ServiceGroup]) -> Command {
    let root = Command::new("rack")
        .about("Command-line interface to a cloud provider's APIs")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true);
    let mut root = GlobalArgs::augment_args(root);

    for service in registry {
        let mut service_cmd = Command::new(service.name)
            .about(service.about)
            .subcommand_required(true)
            .arg_required_else_help(true);
        for resource in &service.resources {
            let mut resource_cmd = Command::new(resource.name)
                .about(resource.about)
                .subcommand_required(true)
                .arg_required_else_help(true);
            for command in &resource.commands {
                let leaf = command
                    .command_flags()
                    .iter()
                    .fold(
                        Command::new(command.command_name())
                            .about(command.command_about())
                            .help_template(LEAF_HELP_TEMPLATE),
                        |leaf, spec| leaf.arg(spec.to_arg()),
                    );
                resource_cmd = resource_cmd.subcommand(leaf);
            }
            service_cmd = service_cmd.subcommand(resource_cmd);
        }
        root = root.subcommand(service_cmd);
    }
    root
}

/// Global flags as seen by the selected leaf command.
pub fn global_args(matches: &ArgMatches) -> Result<GlobalArgs, RackError> {
    let (_, leaf) = leaf_matches(matches);
    GlobalArgs::from_arg_matches(leaf).map_err(|e| {
        ValidationError::InvalidValue {
            flag: "global".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
