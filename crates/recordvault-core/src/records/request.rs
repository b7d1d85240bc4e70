//! Typed request bodies.
//!
//! Callers deserialize into these and call `validate()`; the pipeline and
//! the facade validate again before touching any key material.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, VaultError};
use crate::validation::{validate_email, validate_payload, validate_required};

/// A record to add or an update to apply.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRequest {
    pub name: String,
    pub email: String,
    /// Any JSON value except `null` or `""`.
    #[serde(default)]
    pub sensitive_data: Value,
}

impl RecordRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>, sensitive_data: Value) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            sensitive_data,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_required("Name", &self.name)?;
        validate_email(&self.email)?;
        validate_payload(&self.sensitive_data)
    }
}

/// Admin credentials as presented at login or re-verification.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Presence checks only. A badly formed email is simply an unknown one.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(VaultError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
