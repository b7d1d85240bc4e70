use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use tempfile::{tempdir, TempDir};

use recordvault_core::crypto::{Ciphertext, KeyManager, MissingKeyPolicy};
use recordvault_core::records::{PayloadOutcome, RecordPipeline, RecordRequest};
use recordvault_core::storage::{NewRecord, RecordStore, SqliteStore};
use recordvault_core::VaultError;

const PASSPHRASE: &str = "correct horse battery staple";

fn pipeline(policy: MissingKeyPolicy) -> (TempDir, Arc<SqliteStore>, RecordPipeline) {
    let dir = tempdir().expect("tempdir");
    let keys = KeyManager::new(
        dir.path().join("keys"),
        SecretString::from(PASSPHRASE.to_string()),
        policy,
    )
    .with_modulus_bits(2048);
    let store = Arc::new(SqliteStore::open(&dir.path().join("vault.db")).expect("open store"));
    let pipeline = RecordPipeline::new(Arc::new(keys), store.clone());
    (dir, store, pipeline)
}

#[test]
fn test_tampered_record_fails_alone() {
    let (_dir, store, pipeline) = pipeline(MissingKeyPolicy::Generate);

    let ids: Vec<i64> = ["one", "two", "three"]
        .iter()
        .map(|note| {
            pipeline
                .add_record(&RecordRequest::new("Jane", "jane@x.com", json!({ "note": note })))
                .expect("add should succeed")
        })
        .collect();

    let victim = store.get_record(ids[1]).expect("get").expect("exists");
    let mut chunks = Ciphertext::from_json(&victim.sensitive_data)
        .expect("stored ciphertext parses")
        .chunks()
        .to_vec();
    let mut bytes = chunks[0].clone().into_bytes();
    bytes[10] = if bytes[10] == b'A' { b'B' } else { b'A' };
    chunks[0] = String::from_utf8(bytes).expect("ascii");
    let tampered = Ciphertext::from_chunks(chunks).to_json().expect("to_json");
    store
        .update_record(
            ids[1],
            &NewRecord {
                name: victim.name.clone(),
                email: victim.email.clone(),
                sensitive_data: tampered,
            },
        )
        .expect("overwrite");

    let views = pipeline.list_records().expect("list should succeed");
    assert_eq!(views.len(), 3);
    assert_eq!(
        views.iter().map(|v| v.record.id).collect::<Vec<_>>(),
        ids
    );
    assert_eq!(views[0].payload, PayloadOutcome::Decrypted(json!({"note": "one"})));
    assert!(matches!(views[1].payload, PayloadOutcome::Failed(_)));
    assert_eq!(views[2].payload, PayloadOutcome::Decrypted(json!({"note": "three"})));

    assert!(matches!(
        pipeline.get_record(ids[1]),
        Err(VaultError::Decryption(_))
    ));
}

#[test]
fn test_failure_reason_carries_no_plaintext() {
    let (_dir, store, pipeline) = pipeline(MissingKeyPolicy::Generate);
    pipeline
        .add_record(&RecordRequest::new("A", "a@x.com", json!("warm-up")))
        .expect("add");
    store
        .insert_record(&NewRecord {
            name: "B".to_string(),
            email: "b@x.com".to_string(),
            sensitive_data: "{\"secret\": \"do-not-echo\"}".to_string(),
        })
        .expect("insert raw");

    let views = pipeline.list_records().expect("list");
    match &views[1].payload {
        PayloadOutcome::Failed(reason) => assert!(!reason.contains("do-not-echo")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_validation_runs_before_key_access() {
    let (_dir, _store, pipeline) = pipeline(MissingKeyPolicy::Fail);

    let invalid = RecordRequest::new("", "jane@x.com", json!("data"));
    assert!(matches!(
        pipeline.add_record(&invalid),
        Err(VaultError::Validation(_))
    ));

    let null_payload = RecordRequest::new("Jane", "jane@x.com", json!(null));
    assert!(matches!(
        pipeline.add_record(&null_payload),
        Err(VaultError::Validation(_))
    ));

    let valid = RecordRequest::new("Jane", "jane@x.com", json!("data"));
    assert!(matches!(
        pipeline.add_record(&valid),
        Err(VaultError::KeyMaterial(_))
    ));
}

#[test]
fn test_updates_reencrypt_under_current_key() {
    let (_dir, store, pipeline) = pipeline(MissingKeyPolicy::Generate);
    let id = pipeline
        .add_record(&RecordRequest::new("Jane", "jane@x.com", json!("v1")))
        .expect("add");
    let before = store.get_record(id).expect("get").expect("exists");

    pipeline
        .update_record(id, &RecordRequest::new("Jane", "jane@x.com", json!("v1")))
        .expect("update");
    let after = store.get_record(id).expect("get").expect("exists");

    // OAEP is randomized, so identical plaintext yields fresh ciphertext
    assert_ne!(before.sensitive_data, after.sensitive_data);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(pipeline.get_record(id).expect("get").sensitive_data, json!("v1"));
}
