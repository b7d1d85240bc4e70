//! Admin credential verification.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::password::{prepare_dummy_hash, verify_against_dummy, verify_password};
use crate::error::{AuthError, Result};
use crate::storage::{AdminCredential, AdminId, CredentialStore};
use crate::validation::normalize_email;

/// The minimal identity handed out after a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: AdminId,
    pub email: String,
}

/// Checks email/password pairs against the credential store.
///
/// Every rejection is `AuthError::InvalidCredentials`, whether the email is
/// unknown, the password is wrong, the account is inactive, or the stored
/// hash is unreadable. Each of those paths pays for one Argon2 comparison.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        if !prepare_dummy_hash() {
            tracing::warn!("Dummy password hash unavailable; unknown emails will answer faster");
        }
        Self { store }
    }

    /// Verify a login and stamp the admin's last-login time.
    pub fn verify(&self, email: &str, password: &str) -> Result<AdminIdentity> {
        let admin = self.check(email, password)?;
        self.store.record_login(admin.id, Utc::now())?;
        tracing::info!(admin_id = admin.id, "Admin login verified");

        Ok(AdminIdentity {
            id: admin.id,
            email: admin.email,
        })
    }

    /// Confirm credentials for a sensitive action without counting it as a
    /// login.
    pub fn reverify(&self, email: &str, password: &str) -> Result<()> {
        let admin = self.check(email, password)?;
        tracing::debug!(admin_id = admin.id, "Admin credentials reconfirmed");
        Ok(())
    }

    fn check(&self, email: &str, password: &str) -> Result<AdminCredential> {
        let email = normalize_email(email);
        let Some(admin) = self.store.find_active_admin(&email)? else {
            verify_against_dummy(password);
            tracing::info!("Credential check rejected");
            return Err(AuthError::InvalidCredentials.into());
        };

        match verify_password(password, &admin.password_hash) {
            Ok(true) => Ok(admin),
            Ok(false) => {
                tracing::info!("Credential check rejected");
                Err(AuthError::InvalidCredentials.into())
            }
            Err(err) => {
                verify_against_dummy(password);
                tracing::error!(admin_id = admin.id, error = %err, "Stored password hash is unreadable");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}
