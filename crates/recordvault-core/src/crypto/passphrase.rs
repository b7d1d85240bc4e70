//! Passphrase validation.
//!
//! Enforces minimum security requirements for the key-wrap passphrase.

use crate::error::{Result, VaultError};

/// Minimum passphrase length in characters.
const MIN_PASSPHRASE_LENGTH: usize = 12;

/// Validate passphrase meets minimum security requirements.
///
/// # Requirements
///
/// - At least 12 characters long
/// - Not empty or only whitespace
///
/// Only checked when wrapping (generation, rewrap). Unwrapping an existing
/// key accepts whatever passphrase the key was wrapped with.
///
/// # Examples
///
/// ```
/// use recordvault_core::crypto::validate_passphrase;
///
/// assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
/// assert!(validate_passphrase("short").is_err());
/// ```
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(VaultError::Validation(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(VaultError::Validation(format!(
            "Passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_passphrase() {
        assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
        assert!(validate_passphrase("exactly12chr").is_ok());
        assert!(validate_passphrase("longer passphrase with spaces and symbols!@#").is_ok());
    }

    #[test]
    fn test_passphrase_too_short() {
        let result = validate_passphrase("short");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least 12 characters"));
    }

    #[test]
    fn test_passphrase_empty() {
        assert!(validate_passphrase("").is_err());
        assert!(validate_passphrase("   ").is_err());
        assert!(validate_passphrase("\n\t").is_err());
    }
}
