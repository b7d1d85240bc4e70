//! Administrator authentication.
//!
//! - **password**: Argon2id hashing in PHC format
//! - **verifier**: email/password checks with uniform failures
//! - **token**: signed, expiring session tokens
//! - **provision**: creating and (de)activating admin accounts

pub mod password;
pub mod provision;
pub mod token;
pub mod verifier;

pub use password::{hash_password, verify_password};
pub use provision::{activate_admin, add_admin, deactivate_admin, set_admin_active};
pub use token::{
    JwtSessions, SessionToken, TokenIssuer, TokenVerifier, DEFAULT_SESSION_TTL_SECONDS,
    MAX_SESSION_TTL_SECONDS,
};
pub use verifier::{AdminIdentity, CredentialVerifier};
