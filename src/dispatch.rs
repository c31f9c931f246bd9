//! Command dispatch: the single control loop shared by every command.
//!
//! validate → resolve input → build one resource per item → execute with bounded
//! concurrency → render → exit status. Input is decoded completely before the first
//! execution hook runs, so malformed input never causes partial remote side effects
//! beyond the decode policy's choice.

use crate::command::Command;
use crate::error::{RackError, ValidationError};
use crate::flags::FlagContext;
use crate::input::{self, DecodePolicy, InputItem, InputMode};
use crate::render::{self, RenderOptions, Rendered};
use crate::resource::{Payload, Resource};
use crate::service::Services;
use crate::validate::{self, InputContract};
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Process exit status. Distinct codes separate the failure classes:
///
/// | code | meaning |
/// |------|---------|
/// | 0    | every item succeeded (or there were none) |
/// | 1    | some items failed, some succeeded |
/// | 2    | validation failure; nothing executed |
/// | 3    | piped input malformed; batch aborted or discarded |
/// | 4    | every item failed |
/// | 5    | configuration or client setup failed |
/// | 70   | internal rendering fault |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    PartialFailure,
    Usage,
    MalformedInput,
    TotalFailure,
    Config,
    Internal,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::PartialFailure => 1,
            ExitStatus::Usage => 2,
            ExitStatus::MalformedInput => 3,
            ExitStatus::TotalFailure => 4,
            ExitStatus::Config => 5,
            ExitStatus::Internal => 70,
        }
    }

    /// Exit status for an error that ended the invocation before or instead of a batch.
    pub fn for_error(err: &RackError) -> Self {
        match err {
            RackError::Validation(_) => ExitStatus::Usage,
            RackError::MalformedInput { .. } => ExitStatus::MalformedInput,
            RackError::Config(_) => ExitStatus::Config,
            RackError::Render(_) => ExitStatus::Internal,
            RackError::Api(_) | RackError::InvalidParams(_) | RackError::Io(_) => {
                ExitStatus::TotalFailure
            }
        }
    }
}

/// Dispatch settings resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Raw `--stdin` selector: a field name or `json`.
    pub stdin: Option<String>,
    /// Maximum number of execution hooks in flight.
    pub workers: usize,
    pub decode_policy: DecodePolicy,
    pub render: RenderOptions,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            stdin: None,
            workers: 4,
            decode_policy: DecodePolicy::Abort,
            render: RenderOptions::default(),
        }
    }
}

/// Per-invocation inputs: parsed command flags, service clients, and standard input.
pub struct Invocation {
    pub flags: FlagContext,
    pub services: Services,
    pub input: Box<dyn BufRead + Send>,
}

/// A dispatched batch, in input order.
#[derive(Debug)]
pub struct Batch<P> {
    pub resources: Vec<Resource<P>>,
    /// Decode fault that ended or discarded the batch.
    pub aborted: Option<RackError>,
}

impl<P> Batch<P> {
    pub fn failed_count(&self) -> usize {
        self.resources.iter().filter(|r| r.err().is_some()).count()
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.aborted.is_some() {
            return ExitStatus::MalformedInput;
        }
        let failed = self.failed_count();
        if failed == 0 {
            ExitStatus::Success
        } else if failed == self.resources.len() {
            ExitStatus::TotalFailure
        } else {
            ExitStatus::PartialFailure
        }
    }
}

/// Rendered output plus the exit status of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub rendered: Rendered,
    pub status: ExitStatus,
}

pub struct Dispatcher {
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Result<Self, RackError> {
        if options.workers == 0 {
            return Err(ValidationError::InvalidValue {
                flag: "workers".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(Self { options })
    }

    /// Run `command` for one invocation and render the result.
    ///
    /// Returns `Err` only for validation failures and rendering faults; per-item failures
    /// are reported in the batch and reflected in the exit status.
    pub async fn handle<C: Command>(
        &self,
        command: &C,
        invocation: Invocation,
    ) -> Result<Report, RackError> {
        let batch = self.dispatch(command, invocation).await?;
        let mut rendered = render::render(&batch.resources, command.keys(), &self.options.render)?;
        if let Some(err) = &batch.aborted {
            rendered.stderr.push(format!("error: {}", err));
        }
        let status = batch.exit_status();
        info!(
            command = command.name(),
            items = batch.resources.len(),
            failed = batch.failed_count(),
            exit_code = status.code(),
            "Batch finished"
        );
        Ok(Report { rendered, status })
    }

    /// Validate, decode, and execute, returning the settled batch without rendering it.
    pub async fn dispatch<C: Command>(
        &self,
        command: &C,
        invocation: Invocation,
    ) -> Result<Batch<C::Params>, RackError> {
        let Invocation {
            flags,
            services,
            input,
        } = invocation;
        let mode = self.validate(command, &flags)?;
        debug!(command = command.name(), piped = mode.is_piped(), mode = ?mode, "Flags validated");

        let mut batch = self.collect(command, &flags, &mode, input);
        if batch.aborted.is_some() && self.options.decode_policy == DecodePolicy::Discard {
            batch.resources.clear();
        }
        if batch.aborted.is_none() || self.options.decode_policy == DecodePolicy::Abort {
            self.execute(command, &services, &mut batch.resources).await;
        }
        Ok(batch)
    }

    /// Check `flags` against the command's input contract and return the selected mode.
    pub fn validate<C: Command>(
        &self,
        command: &C,
        flags: &FlagContext,
    ) -> Result<InputMode, RackError> {
        let mode = InputMode::from_selector(self.options.stdin.as_deref());
        let contract = InputContract {
            command: command.name(),
            required: command.required_flags(),
            stdin_field: command.stdin_field(),
        };
        validate::validate(&contract, flags, &mode)?;
        Ok(mode)
    }

    /// Build one resource per input item, populating params through the command's hooks.
    fn collect<C: Command>(
        &self,
        command: &C,
        flags: &FlagContext,
        mode: &InputMode,
        reader: Box<dyn BufRead + Send>,
    ) -> Batch<C::Params> {
        let stdin_field = command.stdin_field();
        let mut batch = Batch {
            resources: Vec::new(),
            aborted: None,
        };
        for item in input::resolve(mode, reader) {
            let index = batch.resources.len();
            let item = match item {
                Ok(item) => item,
                Err(err) if self.options.decode_policy == DecodePolicy::Skip => {
                    warn!(index, error = %err, "Skipping malformed input record");
                    let mut resource = Resource::new(index, None);
                    resource.settle(Err(err));
                    batch.resources.push(resource);
                    continue;
                }
                Err(err) => {
                    warn!(index, error = %err, "Malformed input; stopping batch");
                    batch.aborted = Some(err);
                    break;
                }
            };
            let (label, params) = match &item {
                InputItem::Flags => (
                    stdin_field.and_then(|f| flags.get(f)).map(|v| v.display()),
                    command.handle_flags(flags),
                ),
                InputItem::Pipe(pipe) => (
                    Some(pipe.label(stdin_field)),
                    command.handle_pipe(flags, pipe),
                ),
            };
            let mut resource = Resource::new(index, label);
            match params {
                Ok(params) => resource.set_params(params),
                Err(err) => {
                    debug!(index, error = %err, "Parameter hook failed");
                    resource.settle(Err(err));
                }
            }
            batch.resources.push(resource);
        }
        batch
    }

    /// Execute every pending resource with at most `workers` hooks in flight.
    ///
    /// Outcomes land in a slot buffer keyed by resource index; each slot has exactly one
    /// writer. Resources are settled from the buffer after the last hook completes, so
    /// output order is input order regardless of completion order.
    async fn execute<C: Command>(
        &self,
        command: &C,
        services: &Services,
        resources: &mut [Resource<C::Params>],
    ) {
        let mut slots: Vec<Option<Result<Payload, RackError>>> =
            resources.iter().map(|_| None).collect();
        {
            let mut pending = resources
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_pending())
                .filter_map(|(slot, r)| r.params().map(|p| (slot, p)));
            let mut in_flight = FuturesUnordered::new();
            for (slot, params) in pending.by_ref().take(self.options.workers) {
                in_flight.push(run_item(command, services, slot, params));
            }
            while let Some((slot, outcome)) = in_flight.next().await {
                if let Err(err) = &outcome {
                    warn!(index = slot, error = %err, "Item failed");
                }
                slots[slot] = Some(outcome);
                if let Some((slot, params)) = pending.next() {
                    in_flight.push(run_item(command, services, slot, params));
                }
            }
        }
        for (resource, slot) in resources.iter_mut().zip(slots) {
            if let Some(outcome) = slot {
                resource.settle(outcome);
            }
        }
    }
}

async fn run_item<'a, C: Command>(
    command: &'a C,
    services: &'a Services,
    slot: usize,
    params: &'a C::Params,
) -> (usize, Result<Payload, RackError>) {
    debug!(index = slot, "Executing item");
    (slot, command.execute(services, params).await)
}
