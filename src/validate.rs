//! Flag and input-mode validation. Pure: inspects the command's declarations, the supplied
//! flags, and the selected input mode; never touches a resource.

use crate::error::ValidationError;
use crate::flags::FlagContext;
use crate::input::InputMode;

/// What a command declares about its inputs.
#[derive(Debug, Clone, Copy)]
pub struct InputContract<'a> {
    pub command: &'a str,
    pub required: &'a [&'static str],
    pub stdin_field: Option<&'a str>,
}

/// Validate one invocation.
///
/// - Single mode: every required flag must be supplied; all missing flags are reported.
/// - Text pipe mode: the field must be the command's stdin field, must not also be supplied
///   as a flag, and the remaining required flags must be present.
/// - JSON pipe mode: records carry the full parameter set, so none of the required flags
///   may also be supplied directly.
pub fn validate(
    contract: &InputContract<'_>,
    flags: &FlagContext,
    mode: &InputMode,
) -> Result<(), ValidationError> {
    match mode {
        InputMode::Single => check_required(contract.required, flags, None),
        InputMode::Text { field } => {
            let accepted = accepted_field(contract)?;
            if field != accepted {
                return Err(ValidationError::UnsupportedStdinField {
                    given: field.clone(),
                    accepted: accepted.to_string(),
                });
            }
            if flags.is_set(accepted) {
                return Err(ValidationError::ConflictingInput {
                    flag: accepted.to_string(),
                    stdin: field.clone(),
                });
            }
            check_required(contract.required, flags, Some(accepted))
        }
        InputMode::Json => {
            accepted_field(contract)?;
            if let Some(flag) = contract.required.iter().find(|name| flags.is_set(name)) {
                return Err(ValidationError::ConflictingInput {
                    flag: flag.to_string(),
                    stdin: InputMode::JSON_SELECTOR.to_string(),
                });
            }
            Ok(())
        }
    }
}

fn accepted_field<'a>(contract: &InputContract<'a>) -> Result<&'a str, ValidationError> {
    contract
        .stdin_field
        .ok_or_else(|| ValidationError::PipeUnsupported {
            command: contract.command.to_string(),
        })
}

fn check_required(
    required: &[&'static str],
    flags: &FlagContext,
    piped: Option<&str>,
) -> Result<(), ValidationError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| Some(**name) != piped && !flags.is_set(name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFlags(missing))
    }
}
