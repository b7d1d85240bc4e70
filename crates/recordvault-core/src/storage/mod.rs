//! Storage abstraction for RecordVault.
//!
//! The record store and the credential store are collaborators of the core:
//! the core only needs the narrow traits in [`traits`]. [`SqliteStore`]
//! implements both on a single SQLite database.
//!
//! ## Security
//!
//! Stores never see plaintext payloads. The `sensitive_data` column holds
//! the ciphertext wire format verbatim and is parsed by the record pipeline,
//! not by the store, so one malformed row cannot fail a whole listing.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::{CredentialStore, RecordStore};
pub use types::{AdminCredential, AdminId, NewAdmin, NewRecord, RecordId, StoredRecord};
