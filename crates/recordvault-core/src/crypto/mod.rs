//! Cryptographic operations for RecordVault.
//!
//! - **keys**: RSA-4096 key pair lifecycle (generate, persist, load, rewrap)
//! - **chunked**: OAEP/SHA-256 codec for payloads larger than one RSA block
//! - **passphrase**: minimum requirements for the private-key passphrase
//!
//! ## Security Model
//!
//! - Payloads are encrypted to the public key only; decrypting requires the
//!   passphrase-wrapped private key
//! - The private key is stored as PKCS#8 PBES2 (AES-256-CBC), never in clear
//! - Unwrapped key material is zeroized from memory on drop
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the record database
//! - Theft of the keys directory without the passphrase
//!
//! We do NOT defend against:
//! - Compromised host with access to the running process
//! - Payload size inference from chunk count

pub mod chunked;
pub mod keys;
pub mod passphrase;

pub use chunked::{decrypt, decrypt_as, encrypt, max_chunk_bytes, Ciphertext};
pub use keys::{
    inspect_key_dir, stored_fingerprint, KeyDirStatus, KeyManager, KeyPair, MissingKeyPolicy,
};
pub use passphrase::validate_passphrase;
