//! Token-gated facade over the verifier and the record pipeline.
//!
//! This is the surface a transport layer (or the CLI) calls: log in to get
//! a session token, then present that token on every record operation.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{AdminIdentity, CredentialVerifier, SessionToken, TokenIssuer, TokenVerifier};
use crate::crypto::KeyManager;
use crate::error::{AuthError, Result};
use crate::records::{DecryptedRecord, LoginRequest, RecordPipeline, RecordRequest, RecordView};
use crate::storage::{CredentialStore, RecordId, RecordStore};

/// Successful login: who the caller is and the token to present next.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub identity: AdminIdentity,
    pub session: SessionToken,
}

/// Serializable view of a [`LoginResponse`], including the bearer token.
#[derive(Debug, Serialize)]
struct LoginOutput<'a> {
    id: i64,
    email: &'a str,
    token: &'a str,
    expires_at: chrono::DateTime<chrono::Utc>,
}

impl LoginResponse {
    /// JSON body carrying the token. Only hand this to the logged-in caller.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(LoginOutput {
            id: self.identity.id,
            email: &self.identity.email,
            token: self.session.as_str(),
            expires_at: self.session.expires_at(),
        })?)
    }
}

pub struct Vault {
    verifier: CredentialVerifier,
    credentials: Arc<dyn CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    tokens: Arc<dyn TokenVerifier>,
    pipeline: RecordPipeline,
}

impl Vault {
    /// Wire up the facade. `sessions` both issues and verifies tokens.
    pub fn new<S>(
        keys: Arc<KeyManager>,
        records: Arc<dyn RecordStore>,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<S>,
    ) -> Self
    where
        S: TokenIssuer + TokenVerifier + 'static,
    {
        Self {
            verifier: CredentialVerifier::new(credentials.clone()),
            credentials,
            issuer: sessions.clone(),
            tokens: sessions,
            pipeline: RecordPipeline::new(keys, records),
        }
    }

    pub fn pipeline(&self) -> &RecordPipeline {
        &self.pipeline
    }

    /// Verify credentials and issue a session token.
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        request.validate()?;
        let identity = self.verifier.verify(&request.email, &request.password)?;
        let session = self.issuer.issue(&identity)?;
        Ok(LoginResponse { identity, session })
    }

    /// Re-check credentials before a sensitive action. Issues nothing.
    pub fn reverify(&self, request: &LoginRequest) -> Result<()> {
        request.validate()?;
        self.verifier.reverify(&request.email, &request.password)
    }

    /// Resolve a session token to its admin.
    ///
    /// Besides the signature and expiry, the admin must still exist and be
    /// active, so deactivation takes effect before the token expires.
    pub fn authorize(&self, token: &str) -> Result<AdminIdentity> {
        let identity = self.tokens.verify(token)?;
        match self.credentials.find_active_admin(&identity.email)? {
            Some(admin) if admin.id == identity.id => Ok(identity),
            _ => {
                tracing::info!(admin_id = identity.id, "Session for inactive admin rejected");
                Err(AuthError::InvalidToken.into())
            }
        }
    }

    pub fn add_record(&self, token: &str, request: &RecordRequest) -> Result<RecordId> {
        let admin = self.authorize(token)?;
        let id = self.pipeline.add_record(request)?;
        tracing::info!(admin_id = admin.id, record_id = id, "Admin added record");
        Ok(id)
    }

    pub fn list_records(&self, token: &str) -> Result<Vec<RecordView>> {
        self.authorize(token)?;
        self.pipeline.list_records()
    }

    pub fn get_record(&self, token: &str, id: RecordId) -> Result<DecryptedRecord> {
        self.authorize(token)?;
        self.pipeline.get_record(id)
    }

    pub fn update_record(&self, token: &str, id: RecordId, request: &RecordRequest) -> Result<()> {
        let admin = self.authorize(token)?;
        self.pipeline.update_record(id, request)?;
        tracing::info!(admin_id = admin.id, record_id = id, "Admin updated record");
        Ok(())
    }

    pub fn delete_record(&self, token: &str, id: RecordId) -> Result<()> {
        let admin = self.authorize(token)?;
        self.pipeline.delete_record(id)?;
        tracing::info!(admin_id = admin.id, record_id = id, "Admin deleted record");
        Ok(())
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
