//! Error types for RecordVault core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages. Messages must never carry passphrases,
//! passwords, tokens, or key bytes.

use thiserror::Error;

/// Result type alias for RecordVault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Authentication failures.
///
/// `InvalidCredentials` is returned for an unknown email, a wrong password,
/// and an inactive account alike, so callers cannot tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired session token")]
    InvalidToken,
}

/// Core error type for RecordVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key files missing, partial, unreadable, or passphrase-mismatched
    #[error("Key material error: {0}")]
    KeyMaterial(String),

    /// Payload could not be serialized or a chunk failed to encrypt
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Malformed ciphertext, corrupted chunk, or key mismatch
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Credential or session failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request validation error, raised before any cryptographic work
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl VaultError {
    /// True for errors a caller should surface as "invalid credentials".
    pub fn is_auth(&self) -> bool {
        matches!(self, VaultError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display_is_uniform() {
        let err: VaultError = AuthError::InvalidCredentials.into();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(err.is_auth());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: VaultError = io.into();
        assert!(matches!(err, VaultError::Io { .. }));
        assert!(!err.is_auth());
    }
}
