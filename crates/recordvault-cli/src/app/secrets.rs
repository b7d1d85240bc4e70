//! Secrets from the environment, falling back to no-echo prompts.

use dialoguer::Password;
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::errors::CliError;

/// Passphrase that wraps the private key.
pub const PASSPHRASE_ENV: &str = "KEY_ENCRYPTION_PASSPHRASE";

/// Replacement passphrase for `keys rewrap`.
pub const NEW_PASSPHRASE_ENV: &str = "RECORDVAULT_NEW_PASSPHRASE";

/// HS256 signing secret for session tokens.
pub const SESSION_SECRET_ENV: &str = "SESSION_TOKEN_SECRET";

/// Admin password for `admin add`, `login`, and `verify`.
pub const PASSWORD_ENV: &str = "RECORDVAULT_PASSWORD";

fn from_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn prompt(label: &str, confirm: bool) -> anyhow::Result<String> {
    let mut input = Password::new().with_prompt(label);
    if confirm {
        input = input.with_confirmation(
            format!("Confirm {}", label.to_lowercase()),
            "Entries do not match",
        );
    }
    input
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", label.to_lowercase(), e))
}

fn env_or_prompt(
    env: &str,
    label: &str,
    interactive: bool,
    confirm: bool,
) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = from_env(env) {
        return Ok(Zeroizing::new(value));
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No {} provided and no TTY available. Set {}.",
            label.to_lowercase(),
            env
        ))
        .into());
    }
    prompt(label, confirm).map(Zeroizing::new)
}

/// Key passphrase; `confirm` asks twice when creating keys.
pub fn key_passphrase(interactive: bool, confirm: bool) -> anyhow::Result<SecretString> {
    let value = env_or_prompt(PASSPHRASE_ENV, "Key passphrase", interactive, confirm)?;
    Ok(SecretString::from(value.to_string()))
}

pub fn new_key_passphrase(interactive: bool) -> anyhow::Result<SecretString> {
    let value = env_or_prompt(NEW_PASSPHRASE_ENV, "New key passphrase", interactive, true)?;
    Ok(SecretString::from(value.to_string()))
}

pub fn admin_password(interactive: bool, confirm: bool) -> anyhow::Result<Zeroizing<String>> {
    env_or_prompt(PASSWORD_ENV, "Password", interactive, confirm)
}

/// Session signing secret. Never prompted: it must match across runs.
pub fn session_secret() -> anyhow::Result<SecretString> {
    from_env(SESSION_SECRET_ENV)
        .map(SecretString::from)
        .ok_or_else(|| {
            CliError::invalid_input(format!(
                "{} is not set; it must hold at least 32 bytes",
                SESSION_SECRET_ENV
            ))
            .into()
        })
}
