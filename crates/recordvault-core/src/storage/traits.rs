//! Store trait definitions.
//!
//! The core depends on these traits only, so the relational backend can be
//! swapped without touching the pipeline or the verifier.

use chrono::{DateTime, Utc};

use super::types::{AdminCredential, AdminId, NewAdmin, NewRecord, RecordId, StoredRecord};
use crate::error::Result;

/// Persistence for protected records.
///
/// Implementations store ciphertext text verbatim and never interpret it.
pub trait RecordStore: Send + Sync {
    /// Insert a record.
    ///
    /// # Returns
    ///
    /// Returns the id of the created record.
    fn insert_record(&self, record: &NewRecord) -> Result<RecordId>;

    /// Get a record by id.
    ///
    /// Returns `Ok(Some(record))` if found, `Ok(None)` if not found.
    fn get_record(&self, id: RecordId) -> Result<Option<StoredRecord>>;

    /// List all records in ascending id order.
    ///
    /// Row metadata must parse for the listing to succeed: a row with an
    /// unreadable timestamp fails the whole call with `VaultError::Storage`
    /// naming that record. Only the encrypted payload is isolated per record,
    /// by the pipeline.
    fn list_records(&self) -> Result<Vec<StoredRecord>>;

    /// Overwrite name, email, and ciphertext of an existing record.
    ///
    /// Returns `false` if no record has this id.
    fn update_record(&self, id: RecordId, record: &NewRecord) -> Result<bool>;

    /// Delete a record.
    ///
    /// Returns `false` if no record has this id.
    fn delete_record(&self, id: RecordId) -> Result<bool>;
}

/// Persistence for admin credentials.
///
/// Emails passed in are already normalized by the caller.
pub trait CredentialStore: Send + Sync {
    /// Look up an admin by email regardless of the active flag.
    fn find_admin(&self, email: &str) -> Result<Option<AdminCredential>>;

    /// Look up an admin by email, returning `None` for deactivated accounts.
    fn find_active_admin(&self, email: &str) -> Result<Option<AdminCredential>> {
        Ok(self.find_admin(email)?.filter(|admin| admin.is_active))
    }

    /// Insert a new, active admin.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Validation` if the email is already taken.
    fn insert_admin(&self, admin: &NewAdmin) -> Result<AdminId>;

    /// Stamp a successful login.
    fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<()>;

    /// Flip the active flag. Returns `false` if no admin has this email.
    fn set_admin_active(&self, email: &str, active: bool) -> Result<bool>;

    /// Number of provisioned admins, active or not.
    fn count_admins(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_are_object_safe() {
        fn _accepts_records(_store: &dyn RecordStore) {}
        fn _accepts_credentials(_store: &dyn CredentialStore) {}
    }
}
