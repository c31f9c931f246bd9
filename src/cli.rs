//! CLI domain: parse, route, help, and output only.
//! The command tree is built from the registry; one route dispatches every leaf command.

mod help;
mod output;
mod parse;
mod route;

pub use help::{command_name, leaf_matches, LEAF_HELP_TEMPLATE};
pub use output::{map_error, write_report};
pub use parse::{build_cli, global_args, GlobalArgs};
pub use route::RunContext;
