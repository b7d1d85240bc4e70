//! Field validation shared by request types and admin provisioning.
//!
//! Everything here runs before any key material is touched.

use crate::error::{Result, VaultError};

/// Column width of the `name` and `email` columns.
pub const MAX_FIELD_BYTES: usize = 255;

/// Upper bound on a serialized sensitive payload.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Minimum admin password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Normalize an email for lookup and uniqueness: trimmed, ASCII-lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Validate an email address.
///
/// Deliberately shallow: one `@`, non-empty local part, a dotted domain,
/// no whitespace. Deliverability is not our concern.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(VaultError::Validation("Email is required".to_string()));
    }
    if email.len() > MAX_FIELD_BYTES {
        return Err(VaultError::Validation(format!(
            "Email too long (max {} bytes)",
            MAX_FIELD_BYTES
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(VaultError::Validation("Invalid email format".to_string()));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(VaultError::Validation("Invalid email format".to_string())),
    };
    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty())
        && domain.contains('.');
    if local.is_empty() || !domain_ok {
        return Err(VaultError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

/// Validate a required, bounded text field such as a record name.
pub fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VaultError::Validation(format!("{} is required", field)));
    }
    if value.len() > MAX_FIELD_BYTES {
        return Err(VaultError::Validation(format!(
            "{} too long (max {} bytes)",
            field, MAX_FIELD_BYTES
        )));
    }
    Ok(())
}

/// Validate a sensitive payload: present, non-empty, and bounded.
pub fn validate_payload(payload: &serde_json::Value) -> Result<()> {
    match payload {
        serde_json::Value::Null => {
            return Err(VaultError::Validation(
                "Sensitive data is required".to_string(),
            ))
        }
        serde_json::Value::String(s) if s.is_empty() => {
            return Err(VaultError::Validation(
                "Sensitive data is required".to_string(),
            ))
        }
        _ => {}
    }

    let size = serde_json::to_vec(payload)?.len();
    if size > MAX_PAYLOAD_BYTES {
        return Err(VaultError::Validation(format!(
            "Sensitive data too large ({} bytes, max {})",
            size, MAX_PAYLOAD_BYTES
        )));
    }
    Ok(())
}

/// Validate a new admin password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(VaultError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
