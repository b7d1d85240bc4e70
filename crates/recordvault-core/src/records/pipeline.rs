//! Encrypt, persist, and decrypt protected records.

use std::sync::Arc;

use rayon::prelude::*;
use rsa::RsaPrivateKey;
use serde::Serialize;
use serde_json::Value;

use super::request::RecordRequest;
use crate::crypto::{decrypt, encrypt, Ciphertext, KeyManager};
use crate::error::{Result, VaultError};
use crate::storage::{NewRecord, RecordId, RecordStore, StoredRecord};

/// Result of decrypting one record during a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PayloadOutcome {
    Decrypted(Value),
    /// Reason text only; never contains plaintext.
    Failed(String),
}

impl PayloadOutcome {
    pub fn is_decrypted(&self) -> bool {
        matches!(self, PayloadOutcome::Decrypted(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PayloadOutcome::Decrypted(value) => Some(value),
            PayloadOutcome::Failed(_) => None,
        }
    }
}

/// A listed record with its per-record decryption outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: StoredRecord,
    pub payload: PayloadOutcome,
}

/// A single record with its payload decrypted.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedRecord {
    #[serde(flatten)]
    pub record: StoredRecord,
    pub sensitive_data: Value,
}

/// Composes the chunked cipher with a record store.
#[derive(Clone)]
pub struct RecordPipeline {
    keys: Arc<KeyManager>,
    store: Arc<dyn RecordStore>,
}

impl RecordPipeline {
    pub fn new(keys: Arc<KeyManager>, store: Arc<dyn RecordStore>) -> Self {
        Self { keys, store }
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Encrypt the payload under the current public key and persist.
    pub fn add_record(&self, request: &RecordRequest) -> Result<RecordId> {
        let record = self.seal(request)?;
        let id = self.store.insert_record(&record)?;
        tracing::info!(record_id = id, "Record added");
        Ok(id)
    }

    /// Fetch every record and decrypt each one independently.
    ///
    /// A record that fails to decrypt is reported as
    /// [`PayloadOutcome::Failed`] and does not affect the others. Output
    /// order is store order. Failure to obtain the private key at all is
    /// still an error for the whole call.
    pub fn list_records(&self) -> Result<Vec<RecordView>> {
        let records = self.store.list_records()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let pair = self.keys.load_or_create_key_pair()?;
        let private_key = pair.private_key();

        let views: Vec<RecordView> = records
            .into_par_iter()
            .map(|record| {
                let payload = match open(&record.sensitive_data, private_key) {
                    Ok(value) => PayloadOutcome::Decrypted(value),
                    Err(err) => {
                        tracing::warn!(record_id = record.id, error = %err, "Failed to decrypt record");
                        PayloadOutcome::Failed(err.to_string())
                    }
                };
                RecordView { record, payload }
            })
            .collect();

        let failed = views.iter().filter(|v| !v.payload.is_decrypted()).count();
        tracing::debug!(total = views.len(), failed, "Listed records");
        Ok(views)
    }

    /// Fetch and decrypt one record. Decryption failure is an error here.
    pub fn get_record(&self, id: RecordId) -> Result<DecryptedRecord> {
        let record = self
            .store
            .get_record(id)?
            .ok_or_else(|| VaultError::NotFound(format!("Record {}", id)))?;

        let pair = self.keys.load_or_create_key_pair()?;
        let sensitive_data = open(&record.sensitive_data, pair.private_key())?;

        Ok(DecryptedRecord {
            record,
            sensitive_data,
        })
    }

    /// Re-encrypt under the current public key and overwrite.
    pub fn update_record(&self, id: RecordId, request: &RecordRequest) -> Result<()> {
        let record = self.seal(request)?;
        if !self.store.update_record(id, &record)? {
            return Err(VaultError::NotFound(format!("Record {}", id)));
        }
        tracing::info!(record_id = id, "Record updated");
        Ok(())
    }

    pub fn delete_record(&self, id: RecordId) -> Result<()> {
        if !self.store.delete_record(id)? {
            return Err(VaultError::NotFound(format!("Record {}", id)));
        }
        tracing::info!(record_id = id, "Record deleted");
        Ok(())
    }

    fn seal(&self, request: &RecordRequest) -> Result<NewRecord> {
        request.validate()?;
        let public_key = self.keys.public_key()?;
        let ciphertext = encrypt(&request.sensitive_data, &public_key)?;

        Ok(NewRecord {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            sensitive_data: ciphertext.to_json()?,
        })
    }
}

impl std::fmt::Debug for RecordPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordPipeline")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

fn open(stored: &str, private_key: &RsaPrivateKey) -> Result<Value> {
    let ciphertext = Ciphertext::from_json(stored)?;
    decrypt(&ciphertext, private_key)
}
