//! # RecordVault Core
//!
//! Core library for RecordVault - encrypted-at-rest storage for sensitive
//! free-text records, gated behind administrator credentials.
//!
//! This crate provides the key lifecycle, the chunked RSA codec, credential
//! verification, and the record pipeline, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: RSA key management and the chunked OAEP cipher
//! - **auth**: Password hashing, credential verification, session tokens
//! - **records**: Request types and the encrypt/persist/decrypt pipeline
//! - **storage**: Store traits and the SQLite implementation
//! - **service**: Token-gated facade over the components above

pub mod auth;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod records;
pub mod service;
pub mod storage;
pub mod validation;

pub use error::{AuthError, Result, VaultError};
pub use service::Vault;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
