//! CLI route: run context and the single route from parsed matches to a registered command.

use crate::cli::help::{command_name, leaf_matches};
use crate::cli::output::{map_error, write_error_line, write_report};
use crate::cli::parse::{build_cli, global_args, GlobalArgs};
use crate::commands::{self, ServiceGroup};
use crate::config::RackConfig;
use crate::dispatch::{DispatchOptions, Dispatcher, ExitStatus, Invocation, Report};
use crate::error::{RackError, ValidationError};
use crate::flags::FlagContext;
use crate::render::RenderOptions;
use crate::service::{HttpObjectStorage, Services};
use clap::ArgMatches;
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Runtime context for CLI execution: resolved config, service clients, and the registry.
///
/// A client setup fault is held until a command has passed flag validation, so usage errors
/// are reported first.
pub struct RunContext {
    config: RackConfig,
    services: Result<Services, String>,
    registry: Vec<ServiceGroup>,
    color: bool,
}

impl RunContext {
    pub fn new(config: RackConfig, services: Services) -> Self {
        Self {
            config,
            services: Ok(services),
            registry: commands::registry(),
            color: false,
        }
    }

    /// Build the context with the HTTP service client described by `config.service`.
    pub fn from_config(config: RackConfig) -> Self {
        let services = match HttpObjectStorage::from_config(&config.service) {
            Ok(storage) => Ok(Services::new(Arc::new(storage))
                .with_poll_interval(Duration::from_secs(config.service.poll_interval_secs))),
            Err(e) => {
                warn!("Service client unavailable: {}", e);
                Err(match e {
                    RackError::Config(message) => message,
                    other => other.to_string(),
                })
            }
        };
        Self {
            config,
            services,
            registry: commands::registry(),
            color: false,
        }
    }

    /// Color the `error:` prefix on standard error.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Dispatch settings for one run: config values overridden by global flags.
    pub fn dispatch_options(&self, globals: &GlobalArgs) -> DispatchOptions {
        DispatchOptions {
            stdin: globals.stdin.clone(),
            workers: globals.workers.unwrap_or(self.config.batch.workers),
            decode_policy: globals
                .on_decode_error
                .unwrap_or(self.config.batch.on_decode_error),
            render: RenderOptions {
                format: globals.output.unwrap_or(self.config.output.format),
                fields: globals.fields.clone(),
                header: self.config.output.header && !globals.no_header,
            },
        }
    }

    /// Route parsed matches to the selected command and run it.
    pub async fn execute(
        &self,
        matches: &ArgMatches,
        input: Box<dyn BufRead + Send>,
    ) -> Result<Report, RackError> {
        let (path, leaf) = leaf_matches(matches);
        let command = match path.as_slice() {
            [service, resource, action] => {
                commands::find(&self.registry, service, resource, action)
            }
            _ => None,
        }
        .ok_or_else(|| ValidationError::InvalidValue {
            flag: "command".to_string(),
            reason: format!("unknown command `{}`", path.join(" ")),
        })?;

        let globals = global_args(matches)?;
        let dispatcher = Dispatcher::new(self.dispatch_options(&globals))?;
        let flags = FlagContext::from_matches(&command.command_flags(), leaf);
        let supplied: Vec<&str> = flags.names().collect();
        debug!(command = %command_name(matches), flags = ?supplied, "Routing command");

        command.check(&dispatcher, &flags)?;
        let services = self.services.clone().map_err(RackError::Config)?;
        let services = match globals.poll_interval {
            Some(secs) => services.with_poll_interval(Duration::from_secs(secs)),
            None => services,
        };

        command
            .run(
                &dispatcher,
                Invocation {
                    flags,
                    services,
                    input,
                },
            )
            .await
    }

    /// Run parsed matches, writing results and errors to the given streams. Returns the
    /// process exit code.
    pub async fn run_matches(
        &self,
        matches: &ArgMatches,
        input: Box<dyn BufRead + Send>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> i32 {
        match self.execute(matches, input).await {
            Ok(report) => {
                if let Err(e) = write_report(&report, stdout, stderr, self.color) {
                    error!("Failed to write output: {}", e);
                    return ExitStatus::Internal.code();
                }
                report.status.code()
            }
            Err(e) => {
                error!(command = %command_name(matches), "Command failed: {}", e);
                // Nothing else can be reported if stderr itself is gone.
                let _ = write_error_line(stderr, &map_error(&e), self.color);
                ExitStatus::for_error(&e).code()
            }
        }
    }

    /// Parse `args` and run them. Usage errors and help go to the streams like any other
    /// output.
    pub async fn run_with_io<I, T>(
        &self,
        args: I,
        input: Box<dyn BufRead + Send>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match build_cli(&self.registry).try_get_matches_from(args) {
            Ok(matches) => self.run_matches(&matches, input, stdout, stderr).await,
            Err(e) => {
                let text = e.render().to_string();
                let _ = if e.use_stderr() {
                    stderr.write_all(text.as_bytes())
                } else {
                    stdout.write_all(text.as_bytes())
                };
                e.exit_code()
            }
        }
    }
}
