//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifier of a protected record.
pub type RecordId = i64;

/// Identifier of an admin credential.
pub type AdminId = i64;

/// A protected record as persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: RecordId,

    pub name: String,

    pub email: String,

    /// Ciphertext in its storage format (JSON array of base64 chunks).
    /// Kept as raw text; see the module docs of `storage`.
    #[serde(skip)]
    pub sensitive_data: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Values written by an insert or an update.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
    pub email: String,
    /// Ciphertext storage format, produced by the record pipeline.
    pub sensitive_data: String,
}

/// A stored admin credential.
#[derive(Clone)]
pub struct AdminCredential {
    pub id: AdminId,

    /// Normalized (trimmed, lowercase) email; unique.
    pub email: String,

    /// Argon2id PHC string.
    pub password_hash: String,

    /// Deactivated admins cannot log in. Admins are never deleted.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub last_login_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

/// Builder for provisioning a new admin.
#[derive(Clone)]
pub struct NewAdmin {
    pub email: String,
    pub password_hash: String,
}

impl NewAdmin {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}
