//! Session tokens for verified admins.
//!
//! Tokens are HS256-signed JWTs carrying the admin id and email, an issue
//! time, an expiry, and a random token id. They verify without a database
//! round trip; revocation before expiry is left to the caller's session
//! store.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::verifier::AdminIdentity;
use crate::error::{AuthError, Result, VaultError};

/// Minimum length of the signing secret in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Default session lifetime: one hour.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 3600;

/// Longest accepted session lifetime: 366 days.
pub const MAX_SESSION_TTL_SECONDS: u64 = 366 * 24 * 3600;

/// An issued bearer token and its expiry.
#[derive(Clone)]
pub struct SessionToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Creates session tokens for verified identities.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, identity: &AdminIdentity) -> Result<SessionToken>;
}

/// Resolves a presented token back to the identity it was issued for.
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed, tampered, foreign, or
    /// expired tokens.
    fn verify(&self, token: &str) -> Result<AdminIdentity>;
}

/// Payload stored in the JWT.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Admin id
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
    /// Random token id; makes every token unique
    jti: String,
}

/// HS256 JWT issuer and verifier.
pub struct JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtSessions {
    /// Build from the server secret.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Validation` if the secret is shorter than
    /// [`MIN_SECRET_BYTES`] or the TTL is zero or above
    /// [`MAX_SESSION_TTL_SECONDS`].
    pub fn new(secret: &SecretString, ttl_seconds: u64) -> Result<Self> {
        let secret = secret.expose_secret().as_bytes();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(VaultError::Validation(format!(
                "Session secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0 && secs.unsigned_abs() <= MAX_SESSION_TTL_SECONDS)
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                VaultError::Validation(format!("Invalid session TTL: {} seconds", ttl_seconds))
            })?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    fn issue_at(&self, identity: &AdminIdentity, now: DateTime<Utc>) -> Result<SessionToken> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            VaultError::Validation("Session expiry is out of range".to_string())
        })?;
        let claims = Claims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| VaultError::Encryption(format!("Failed to sign session token: {}", e)))?;

        Ok(SessionToken { token, expires_at })
    }
}

impl std::fmt::Debug for JwtSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessions")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer for JwtSessions {
    fn issue(&self, identity: &AdminIdentity) -> Result<SessionToken> {
        self.issue_at(identity, Utc::now())
    }
}

impl TokenVerifier for JwtSessions {
    fn verify(&self, token: &str) -> Result<AdminIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            tracing::debug!(reason = ?err.kind(), "Session token rejected");
            AuthError::InvalidToken
        })?;
        let id = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AdminIdentity {
            id,
            email: data.claims.email,
        })
    }
}
