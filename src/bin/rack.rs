//! Rack CLI Binary
//!
//! Command-line interface to a cloud provider's APIs.

use rack::cli::{build_cli, global_args, map_error, GlobalArgs, RunContext};
use rack::commands::registry;
use rack::config::ConfigLoader;
use rack::dispatch::ExitStatus;
use rack::logging::{init_logging, LoggingConfig};
use std::io::{BufReader, IsTerminal};
use std::process;
use tracing::info;

#[tokio::main]
async fn main() {
    let matches = build_cli(&registry()).get_matches();
    let globals = match global_args(&matches) {
        Ok(globals) => globals,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(ExitStatus::Usage.code());
        }
    };

    let config = match ConfigLoader::load(globals.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(ExitStatus::for_error(&e).code());
        }
    };

    if !globals.quiet {
        let logging_config = build_logging_config(&config.logging, &globals);
        if let Err(e) = init_logging(&logging_config) {
            eprintln!("{}", map_error(&e));
            process::exit(ExitStatus::Config.code());
        }
    }

    info!("Rack CLI starting");

    let context = RunContext::from_config(config).with_color(std::io::stderr().is_terminal());

    let input = Box::new(BufReader::new(std::io::stdin()));
    let code = context
        .run_matches(&matches, input, &mut std::io::stdout(), &mut std::io::stderr())
        .await;
    info!(exit_code = code, "Rack CLI finished");
    process::exit(code);
}

/// Fold the logging flags over the configured logging section.
fn build_logging_config(base: &LoggingConfig, globals: &GlobalArgs) -> LoggingConfig {
    let mut config = base.clone();
    if globals.verbose {
        config.enabled = true;
        config.level = "debug".to_string();
    }
    if let Some(ref level) = globals.log_level {
        config.enabled = true;
        config.level = level.clone();
    }
    if let Some(ref format) = globals.log_format {
        config.format = format.clone();
    }
    if let Some(ref file) = globals.log_file {
        config.output = "file".to_string();
        config.file = Some(file.clone());
    }
    config
}
