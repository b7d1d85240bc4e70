//! RSA key pair lifecycle.
//!
//! One key pair per deployment lives in a keys directory as two PEM files:
//!
//! - `public_key.pem`: SubjectPublicKeyInfo, in clear
//! - `private_key.pem`: PKCS#8 `ENCRYPTED PRIVATE KEY` (PBES2, AES-256-CBC)
//!
//! Replacing the pair makes every existing ciphertext permanently
//! undecryptable, so generation only happens when the manager was built
//! with [`MissingKeyPolicy::Generate`] or through [`KeyManager::generate`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::crypto::passphrase::validate_passphrase;
use crate::error::{Result, VaultError};
use crate::fs::{write_atomic, write_new_atomic};

pub const PUBLIC_KEY_FILE: &str = "public_key.pem";
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// Modulus size for production keys.
pub const DEFAULT_MODULUS_BITS: usize = 4096;

/// What to do when the keys directory holds no key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeyPolicy {
    /// Missing keys are a fatal `KeyMaterial` error. Steady-state default.
    #[default]
    Fail,
    /// Generate and persist a fresh pair. First-run bootstrap only.
    Generate,
}

/// On-disk state of the keys directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirStatus {
    /// Both key files exist.
    Complete,
    /// Exactly one key file exists. Never repaired automatically.
    Partial,
    /// Neither key file exists.
    Missing,
}

/// An unwrapped RSA key pair.
pub struct KeyPair {
    public: RsaPublicKey,
    private: RsaPrivateKey,
    fingerprint: String,
}

impl KeyPair {
    fn new(public: RsaPublicKey, private: RsaPrivateKey) -> Result<Self> {
        let fingerprint = fingerprint_of(&public)?;
        Ok(Self {
            public,
            private,
            fingerprint,
        })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Hex SHA-256 of the DER-encoded public key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn modulus_bits(&self) -> usize {
        self.public.size() * 8
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Owns the deployment's key pair: generation, persistence, and a
/// compute-once in-memory cache of the unwrapped pair.
///
/// Construct one per process and share it behind an `Arc`.
#[derive(Debug)]
pub struct KeyManager {
    dir: PathBuf,
    passphrase: SecretString,
    policy: MissingKeyPolicy,
    modulus_bits: usize,
    cached: OnceCell<Arc<KeyPair>>,
}

impl KeyManager {
    pub fn new(dir: impl Into<PathBuf>, passphrase: SecretString, policy: MissingKeyPolicy) -> Self {
        Self {
            dir: dir.into(),
            passphrase,
            policy,
            modulus_bits: DEFAULT_MODULUS_BITS,
            cached: OnceCell::new(),
        }
    }

    /// Override the modulus size used when generating. Tests use 2048.
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.modulus_bits = bits;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(PRIVATE_KEY_FILE)
    }

    /// Inspect the keys directory without unwrapping anything.
    pub fn status(&self) -> KeyDirStatus {
        inspect_key_dir(&self.dir)
    }

    /// Return the active key pair, loading it on first use.
    ///
    /// Concurrent first calls are serialized: exactly one load (or
    /// generation, if the policy allows it) runs, and every caller gets the
    /// same pair. A failed attempt leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::KeyMaterial` if:
    /// - Keys are missing and the policy is `Fail`
    /// - Only one of the two key files exists
    /// - The passphrase is wrong or a key file is corrupt
    pub fn load_or_create_key_pair(&self) -> Result<Arc<KeyPair>> {
        self.cached
            .get_or_try_init(|| match self.status() {
                KeyDirStatus::Complete => self.load_pair().map(Arc::new),
                KeyDirStatus::Partial => Err(self.partial_error()),
                KeyDirStatus::Missing => match self.policy {
                    MissingKeyPolicy::Generate => self.create_pair().map(Arc::new),
                    MissingKeyPolicy::Fail => Err(VaultError::KeyMaterial(format!(
                        "No key pair found in {}; run `recordvault keys init` to create one",
                        self.dir.display()
                    ))),
                },
            })
            .cloned()
    }

    /// The current public key.
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        Ok(self.load_or_create_key_pair()?.public_key().clone())
    }

    /// The current private key, unwrapped.
    pub fn private_key(&self) -> Result<RsaPrivateKey> {
        Ok(self.load_or_create_key_pair()?.private_key().clone())
    }

    /// Fingerprint of the active pair.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(self.load_or_create_key_pair()?.fingerprint().to_string())
    }

    /// Create a key pair as an explicit operator action.
    ///
    /// Ignores the missing-key policy but refuses to touch a directory that
    /// already holds any key file.
    pub fn generate(&self) -> Result<Arc<KeyPair>> {
        let mut created = false;
        let pair = self.cached.get_or_try_init(|| match self.status() {
            KeyDirStatus::Missing => {
                created = true;
                self.create_pair().map(Arc::new)
            }
            KeyDirStatus::Partial => Err(self.partial_error()),
            KeyDirStatus::Complete => Err(self.exists_error()),
        })?;
        if !created {
            return Err(self.exists_error());
        }
        Ok(pair.clone())
    }

    /// Re-encrypt the stored private key under `new_passphrase`.
    ///
    /// The key pair itself is unchanged, so existing ciphertexts remain
    /// decryptable. The old passphrase must still unwrap the current file.
    pub fn rewrap_private_key(&mut self, new_passphrase: SecretString) -> Result<()> {
        validate_passphrase(new_passphrase.expose_secret())?;
        let pair = match self.status() {
            KeyDirStatus::Complete => self.load_or_create_key_pair()?,
            KeyDirStatus::Partial => return Err(self.partial_error()),
            KeyDirStatus::Missing => {
                return Err(VaultError::KeyMaterial(format!(
                    "No key pair found in {}; nothing to rewrap",
                    self.dir.display()
                )))
            }
        };

        let pem = wrap_private_key(pair.private_key(), &new_passphrase)?;
        write_atomic(&self.private_key_path(), pem.as_bytes(), true)?;
        self.passphrase = new_passphrase;

        tracing::info!(
            fingerprint = %pair.fingerprint(),
            "Private key rewrapped under a new passphrase"
        );
        Ok(())
    }

    fn load_pair(&self) -> Result<KeyPair> {
        let public_pem = read_key_file(&self.public_key_path())?;
        let private_pem = Zeroizing::new(read_key_file(&self.private_key_path())?);

        let public = RsaPublicKey::from_public_key_pem(&public_pem).map_err(|_| {
            VaultError::KeyMaterial(format!(
                "Public key file {} is corrupt",
                self.public_key_path().display()
            ))
        })?;
        let private = RsaPrivateKey::from_pkcs8_encrypted_pem(
            &private_pem,
            self.passphrase.expose_secret().as_bytes(),
        )
        .map_err(|_| {
            VaultError::KeyMaterial(
                "Failed to unwrap private key: wrong passphrase or corrupt key file".to_string(),
            )
        })?;
        private
            .validate()
            .map_err(|_| VaultError::KeyMaterial("Private key failed validation".to_string()))?;

        if RsaPublicKey::from(&private) != public {
            return Err(VaultError::KeyMaterial(
                "Public and private key files do not belong to the same key pair".to_string(),
            ));
        }

        let pair = KeyPair::new(public, private)?;
        tracing::info!(
            fingerprint = %pair.fingerprint(),
            bits = pair.modulus_bits(),
            "Loaded RSA key pair"
        );
        Ok(pair)
    }

    fn create_pair(&self) -> Result<KeyPair> {
        validate_passphrase(self.passphrase.expose_secret())?;

        tracing::warn!(
            dir = %self.dir.display(),
            bits = self.modulus_bits,
            "GENERATING A NEW RSA KEY PAIR: ciphertext produced under any previous key pair \
             cannot be decrypted with it"
        );

        fs::create_dir_all(&self.dir).map_err(|e| {
            VaultError::KeyMaterial(format!(
                "Failed to create keys directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let private = RsaPrivateKey::new(&mut OsRng, self.modulus_bits)
            .map_err(|e| VaultError::KeyMaterial(format!("Key generation failed: {}", e)))?;
        let public = RsaPublicKey::from(&private);

        let private_pem = wrap_private_key(&private, &self.passphrase)?;
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| VaultError::KeyMaterial(format!("Public key encoding failed: {}", e)))?;

        // Private first: a crash in between leaves a partial pair, which is
        // refused on the next start instead of silently regenerated. Both
        // writes are exclusive, so a racing generator loses at the first one.
        let private_path = self.private_key_path();
        write_new_atomic(&private_path, private_pem.as_bytes(), true)
            .map_err(|e| self.create_error(&private_path, e))?;
        let public_path = self.public_key_path();
        write_new_atomic(&public_path, public_pem.as_bytes(), false)
            .map_err(|e| self.create_error(&public_path, e))?;

        let pair = KeyPair::new(public, private)?;
        tracing::warn!(fingerprint = %pair.fingerprint(), "New RSA key pair persisted");
        Ok(pair)
    }

    fn partial_error(&self) -> VaultError {
        VaultError::KeyMaterial(format!(
            "Incomplete key pair in {}: expected both {} and {}; restore the missing file from backup",
            self.dir.display(),
            PUBLIC_KEY_FILE,
            PRIVATE_KEY_FILE
        ))
    }

    fn create_error(&self, path: &Path, err: std::io::Error) -> VaultError {
        if err.kind() == std::io::ErrorKind::AlreadyExists {
            return self.exists_error();
        }
        VaultError::KeyMaterial(format!("Failed to write {}: {}", path.display(), err))
    }

    fn exists_error(&self) -> VaultError {
        VaultError::KeyMaterial(format!(
            "Key pair already exists in {}; refusing to replace it",
            self.dir.display()
        ))
    }
}

/// Report which key files exist in `dir`. Needs no passphrase.
pub fn inspect_key_dir(dir: &Path) -> KeyDirStatus {
    match (
        dir.join(PUBLIC_KEY_FILE).exists(),
        dir.join(PRIVATE_KEY_FILE).exists(),
    ) {
        (true, true) => KeyDirStatus::Complete,
        (false, false) => KeyDirStatus::Missing,
        _ => KeyDirStatus::Partial,
    }
}

/// Fingerprint of the public key stored in `dir`, read without the passphrase.
pub fn stored_fingerprint(dir: &Path) -> Result<String> {
    let path = dir.join(PUBLIC_KEY_FILE);
    let pem = read_key_file(&path)?;
    let public = RsaPublicKey::from_public_key_pem(&pem).map_err(|_| {
        VaultError::KeyMaterial(format!("Public key file {} is corrupt", path.display()))
    })?;
    fingerprint_of(&public)
}

fn wrap_private_key(private: &RsaPrivateKey, passphrase: &SecretString) -> Result<Zeroizing<String>> {
    private
        .to_pkcs8_encrypted_pem(
            &mut OsRng,
            passphrase.expose_secret().as_bytes(),
            LineEnding::LF,
        )
        .map_err(|e| VaultError::KeyMaterial(format!("Private key wrap failed: {}", e)))
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        VaultError::KeyMaterial(format!("Failed to read {}: {}", path.display(), e.kind()))
    })
}

fn fingerprint_of(public: &RsaPublicKey) -> Result<String> {
    let der = public
        .to_public_key_der()
        .map_err(|e| VaultError::KeyMaterial(format!("Public key encoding failed: {}", e)))?;
    Ok(hex::encode(Sha256::digest(der.as_bytes())))
}
