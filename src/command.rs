//! The command contract.
//!
//! Every concrete command implements [`Command`]: it declares its flags and output keys,
//! builds its own parameter value from flags or from one piped item, and executes against
//! the service clients. The parameter type is owned by the command; the framework carries
//! it opaquely and never inspects it.
//!
//! [`Runnable`] is the object-safe face of a command used by the CLI route table. It is
//! implemented for every `Command`, so all commands share the single dispatch path in
//! [`Dispatcher::handle`].

use crate::dispatch::{Dispatcher, Invocation, Report};
use crate::error::RackError;
use crate::flags::{FlagContext, FlagSpec};
use crate::input::PipeItem;
use crate::resource::Payload;
use crate::service::Services;
use async_trait::async_trait;

#[async_trait]
pub trait Command: Send + Sync {
    /// Command-specific parameter shape.
    type Params: Send + Sync;

    fn name(&self) -> &'static str;

    fn about(&self) -> &'static str;

    /// Every flag the command accepts.
    fn flags(&self) -> Vec<FlagSpec>;

    /// Flags that must be present when the command runs from flags alone.
    fn required_flags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Output fields shown by default in table mode.
    fn keys(&self) -> &'static [&'static str];

    /// The single field this command accepts from plain-text standard input, if any.
    fn stdin_field(&self) -> Option<&'static str> {
        None
    }

    /// Build parameters from the parsed flags (single mode).
    fn handle_flags(&self, flags: &FlagContext) -> Result<Self::Params, RackError>;

    /// Build parameters from one piped item. `flags` carries any non-piped flags supplied
    /// alongside `--stdin`.
    fn handle_pipe(&self, flags: &FlagContext, item: &PipeItem) -> Result<Self::Params, RackError> {
        let _ = (flags, item);
        Err(RackError::InvalidParams(format!(
            "{} does not accept piped input",
            self.name()
        )))
    }

    /// Perform the remote call. Ordinary API failures are returned, never panicked on.
    async fn execute(&self, services: &Services, params: &Self::Params)
        -> Result<Payload, RackError>;
}

/// Object-safe command handle used for routing.
#[async_trait]
pub trait Runnable: Send + Sync {
    fn command_name(&self) -> &'static str;

    fn command_about(&self) -> &'static str;

    fn command_flags(&self) -> Vec<FlagSpec>;

    /// Validate flags without touching input or services.
    fn check(&self, dispatcher: &Dispatcher, flags: &FlagContext) -> Result<(), RackError>;

    async fn run(&self, dispatcher: &Dispatcher, invocation: Invocation)
        -> Result<Report, RackError>;
}

#[async_trait]
impl<C> Runnable for C
where
    C: Command,
{
    fn command_name(&self) -> &'static str {
        self.name()
    }

    fn command_about(&self) -> &'static str {
        self.about()
    }

    fn command_flags(&self) -> Vec<FlagSpec> {
        self.flags()
    }

    fn check(&self, dispatcher: &Dispatcher, flags: &FlagContext) -> Result<(), RackError> {
        dispatcher.validate(self, flags).map(|_| ())
    }

    async fn run(
        &self,
        dispatcher: &Dispatcher,
        invocation: Invocation,
    ) -> Result<Report, RackError> {
        dispatcher.handle(self, invocation).await
    }
}
