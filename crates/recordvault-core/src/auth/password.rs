//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant with the crate's default parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::error::{Result, VaultError};

/// Hash compared against when the email is unknown, so that path costs
/// the same as a real comparison.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("recordvault-timing-equalizer").ok());

/// Hash a password using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(hash_failure)
}

/// Hashing failures are internal faults, not bad input.
fn hash_failure(err: argon2::password_hash::Error) -> VaultError {
    VaultError::Storage(format!("Failed to hash password: {err}"))
}

/// Verify a password against a stored hash
///
/// Returns true if the password matches the hash.
///
/// # Errors
///
/// Returns `VaultError::Storage` if the stored hash is not a PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| VaultError::Storage(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Compute the dummy hash now so no caller pays for it during a check.
///
/// Returns whether a dummy hash is available.
pub(crate) fn prepare_dummy_hash() -> bool {
    Lazy::force(&DUMMY_HASH).is_some()
}

/// Spend one verification's worth of work and discard the result.
pub(crate) fn verify_against_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}
