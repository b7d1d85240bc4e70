//! Chunked RSA-OAEP codec.
//!
//! RSA can only encrypt a message slightly smaller than its modulus, so a
//! payload is serialized to JSON, split into slices of at most
//! [`max_chunk_bytes`], and each slice is encrypted on its own with
//! OAEP/SHA-256. The result is the ordered list of base64 chunks.
//!
//! Chunk count reveals the payload size to within one chunk. That is an
//! accepted property of this format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Output size of the OAEP hash (SHA-256).
pub const OAEP_HASH_BYTES: usize = 32;

/// Largest plaintext slice one OAEP/SHA-256 operation accepts under `public_key`.
///
/// `k - 2*hLen - 2`: 446 bytes for a 4096-bit key, 190 for 2048-bit.
pub fn max_chunk_bytes(public_key: &RsaPublicKey) -> usize {
    public_key.size().saturating_sub(2 * OAEP_HASH_BYTES + 2)
}

/// An encrypted payload: ordered base64 chunks.
///
/// Serializes as a bare JSON array of strings, which is also the storage
/// format of the `sensitive_data` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(Vec<String>);

impl Ciphertext {
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        Self(chunks)
    }

    pub fn chunks(&self) -> &[String] {
        &self.0
    }

    pub fn chunk_count(&self) -> usize {
        self.0.len()
    }

    /// Encode to the storage format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Parse the storage format.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Decryption` unless `text` is a JSON array of strings.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str::<Vec<String>>(text)
            .map(Self)
            .map_err(|_| {
                VaultError::Decryption("Ciphertext is not a JSON array of strings".to_string())
            })
    }
}

/// Encrypt any serializable payload under `public_key`.
///
/// # Errors
///
/// Returns `VaultError::Encryption` if the payload cannot be serialized to
/// JSON or a chunk fails to encrypt.
pub fn encrypt<T: Serialize + ?Sized>(payload: &T, public_key: &RsaPublicKey) -> Result<Ciphertext> {
    let plaintext = Zeroizing::new(serde_json::to_vec(payload).map_err(|e| {
        VaultError::Encryption(format!("Payload is not serializable: {}", e))
    })?);

    let limit = max_chunk_bytes(public_key);
    if limit == 0 {
        return Err(VaultError::Encryption(
            "RSA key is too small for OAEP with SHA-256".to_string(),
        ));
    }

    let mut rng = OsRng;
    let chunks = split(&plaintext, limit)
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            public_key
                .encrypt(&mut rng, Oaep::new::<Sha256>(), piece)
                .map(|sealed| STANDARD.encode(sealed))
                .map_err(|e| {
                    VaultError::Encryption(format!("Chunk {} encryption failed: {}", index, e))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        bytes = plaintext.len(),
        chunks = chunks.len(),
        "Encrypted payload"
    );
    Ok(Ciphertext(chunks))
}

/// Decrypt a ciphertext back into a JSON value.
///
/// # Errors
///
/// Returns `VaultError::Decryption` if the ciphertext is empty, a chunk is
/// not base64, a chunk fails OAEP decryption (wrong key, corruption), or the
/// reassembled bytes are not JSON.
pub fn decrypt(ciphertext: &Ciphertext, private_key: &RsaPrivateKey) -> Result<serde_json::Value> {
    decrypt_as(ciphertext, private_key)
}

/// Decrypt a ciphertext straight into `T`.
pub fn decrypt_as<T: DeserializeOwned>(
    ciphertext: &Ciphertext,
    private_key: &RsaPrivateKey,
) -> Result<T> {
    if ciphertext.0.is_empty() {
        return Err(VaultError::Decryption("Ciphertext has no chunks".to_string()));
    }

    let mut rng = OsRng;
    let mut plaintext = Zeroizing::new(Vec::new());
    for (index, chunk) in ciphertext.0.iter().enumerate() {
        let sealed = STANDARD.decode(chunk).map_err(|_| {
            VaultError::Decryption(format!("Chunk {} is not valid base64", index))
        })?;
        let opened = Zeroizing::new(
            private_key
                .decrypt_blinded(&mut rng, Oaep::new::<Sha256>(), &sealed)
                .map_err(|_| VaultError::Decryption(format!("Chunk {} failed to decrypt", index)))?,
        );
        plaintext.extend_from_slice(&opened);
    }

    // The serde message can quote decrypted content; report position only.
    serde_json::from_slice(&plaintext).map_err(|e| {
        VaultError::Decryption(format!(
            "Decrypted payload is not valid JSON ({:?} error at line {}, column {})",
            e.classify(),
            e.line(),
            e.column()
        ))
    })
}

/// Split into slices of at most `limit` bytes. Empty input yields one empty slice.
fn split(plaintext: &[u8], limit: usize) -> Vec<&[u8]> {
    if plaintext.is_empty() {
        return vec![plaintext];
    }
    plaintext.chunks(limit).collect()
}
