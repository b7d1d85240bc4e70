//! Operator-side admin account management.
//!
//! No account exists until one is provisioned here; there is no default
//! admin.

use super::password::hash_password;
use crate::error::{Result, VaultError};
use crate::storage::{AdminId, CredentialStore, NewAdmin};
use crate::validation::{normalize_email, validate_email, validate_password};

/// Create an active admin with an Argon2id-hashed password.
///
/// # Errors
///
/// Returns `VaultError::Validation` for a malformed email, a short password,
/// or an email that is already provisioned.
pub fn add_admin(store: &dyn CredentialStore, email: &str, password: &str) -> Result<AdminId> {
    validate_email(email)?;
    validate_password(password)?;
    let email = normalize_email(email);

    if store.find_admin(&email)?.is_some() {
        return Err(VaultError::Validation(
            "Admin with this email already exists".to_string(),
        ));
    }

    let hash = hash_password(password)?;
    let id = store.insert_admin(&NewAdmin::new(email, hash))?;
    tracing::info!(admin_id = id, "Admin provisioned");
    Ok(id)
}

/// Enable or disable an admin account.
pub fn set_admin_active(store: &dyn CredentialStore, email: &str, active: bool) -> Result<()> {
    let email = normalize_email(email);
    if !store.set_admin_active(&email, active)? {
        return Err(VaultError::NotFound(format!("Admin {}", email)));
    }
    tracing::info!(active, "Admin active flag changed");
    Ok(())
}

pub fn deactivate_admin(store: &dyn CredentialStore, email: &str) -> Result<()> {
    set_admin_active(store, email, false)
}

pub fn activate_admin(store: &dyn CredentialStore, email: &str) -> Result<()> {
    set_admin_active(store, email, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    #[test]
    fn test_add_admin_hashes_password() {
        let store = SqliteStore::open_in_memory().unwrap();
        add_admin(&store, "Admin@X.com", "long-enough").unwrap();

        let admin = store.find_admin("admin@x.com").unwrap().unwrap();
        assert!(admin.password_hash.starts_with("$argon2id$"));
        assert!(admin.is_active);
    }

    #[test]
    fn test_add_admin_rejects_duplicates_and_bad_input() {
        let store = SqliteStore::open_in_memory().unwrap();
        add_admin(&store, "admin@x.com", "long-enough").unwrap();

        let dup = add_admin(&store, "ADMIN@x.com", "long-enough");
        assert!(matches!(dup, Err(VaultError::Validation(_))));
        assert!(matches!(
            add_admin(&store, "not-an-email", "long-enough"),
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            add_admin(&store, "other@x.com", "short"),
            Err(VaultError::Validation(_))
        ));
        assert_eq!(store.count_admins().unwrap(), 1);
    }

    #[test]
    fn test_deactivate_and_activate() {
        let store = SqliteStore::open_in_memory().unwrap();
        add_admin(&store, "admin@x.com", "long-enough").unwrap();

        deactivate_admin(&store, "admin@x.com").unwrap();
        assert!(store.find_active_admin("admin@x.com").unwrap().is_none());

        activate_admin(&store, "admin@x.com").unwrap();
        assert!(store.find_active_admin("admin@x.com").unwrap().is_some());

        assert!(matches!(
            deactivate_admin(&store, "ghost@x.com"),
            Err(VaultError::NotFound(_))
        ));
    }
}
