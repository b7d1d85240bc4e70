//! Exit codes and CLI-level errors.

use std::fmt;

use recordvault_core::VaultError;

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (reported by clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    pub const GENERAL: i32 = 1;

    /// Resource not found (config, record, admin).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Bad credentials or session token.
    pub const AUTH_FAILED: i32 = 5;

    /// Key files missing, partial, or locked with another passphrase.
    pub const KEY_MATERIAL: i32 = 6;
}

/// An error raised by the CLI itself, with an exit code and an optional hint.
#[derive(Debug)]
pub struct CliError {
    code: i32,
    message: String,
    hint: Option<String>,
}

impl CliError {
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            code: exit_codes::NOT_FOUND,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: exit_codes::INVALID_INPUT,
            message: message.into(),
            hint: None,
        }
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            code: exit_codes::AUTH_FAILED,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n\n{}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {}

/// Pick the exit code for an error bubbling out of a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return cli.code();
        }
        if let Some(vault) = cause.downcast_ref::<VaultError>() {
            return match vault {
                VaultError::Auth(_) => exit_codes::AUTH_FAILED,
                VaultError::NotFound(_) => exit_codes::NOT_FOUND,
                VaultError::Validation(_) => exit_codes::INVALID_INPUT,
                VaultError::KeyMaterial(_) => exit_codes::KEY_MATERIAL,
                _ => exit_codes::GENERAL,
            };
        }
    }
    exit_codes::GENERAL
}
