//! Error types for the rack command framework.

use thiserror::Error;

/// Flag and input-mode validation failures. Raised before any item is executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required flag(s): {}", join_flags(.0))]
    MissingFlags(Vec<String>),

    #[error("Conflicting input: --{flag} cannot be combined with --stdin {stdin}")]
    ConflictingInput { flag: String, stdin: String },

    #[error("Command `{command}` does not accept piped input")]
    PipeUnsupported { command: String },

    #[error("Unsupported --stdin value `{given}`. Valid values are: {accepted}, json")]
    UnsupportedStdinField { given: String, accepted: String },

    #[error("Invalid value for --{flag}: {reason}")]
    InvalidValue { flag: String, reason: String },
}

fn join_flags(flags: &[String]) -> String {
    flags
        .iter()
        .map(|f| format!("--{}", f))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remote service failures surfaced by the service client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Top-level error taxonomy.
///
/// `Validation` and `MalformedInput` are resolved before remote calls are issued.
/// `Api` and `InvalidParams` are recorded per item and never abort a batch.
/// `Render` is an internal fault.
#[derive(Debug, Error)]
pub enum RackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Malformed input record {index}: {message}")]
    MalformedInput { index: usize, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for RackError {
    fn from(err: config::ConfigError) -> Self {
        RackError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RackError {
    fn from(err: serde_json::Error) -> Self {
        RackError::Render(err.to_string())
    }
}
