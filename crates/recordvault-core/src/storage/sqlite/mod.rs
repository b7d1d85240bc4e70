//! SQLite storage backend.
//!
//! One database file holds both the `admin` credential table and the
//! `records` table. Access goes through a single connection behind a mutex.

mod row;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::error::{Result, VaultError};
use crate::storage::traits::{CredentialStore, RecordStore};
use crate::storage::types::{
    AdminCredential, AdminId, NewAdmin, NewRecord, RecordId, StoredRecord,
};

use row::{AdminRow, RecordRow};

/// Schema version written to the `meta` table.
const SCHEMA_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS admin (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at TEXT NOT NULL,
        last_login TEXT,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        sensitive_data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// SQLite-backed record and credential store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::Storage(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "Opened database");

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match existing.as_deref() {
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(VaultError::Storage(format!(
                    "Unsupported schema version {} (expected {})",
                    other, SCHEMA_VERSION
                )))
            }
        }

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the database file, or `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run SQLite's integrity check.
    pub fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if result != "ok" {
            return Err(VaultError::Storage(format!(
                "Integrity check failed: {}",
                result
            )));
        }
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("SQLite connection poisoned".to_string()))
    }
}

fn now_rfc3339() -> String {
    timestamp(Utc::now())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl RecordStore for SqliteStore {
    fn insert_record(&self, record: &NewRecord) -> Result<RecordId> {
        let conn = self.lock_conn()?;
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO records (name, email, sensitive_data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![record.name, record.email, record.sensitive_data, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_record(&self, id: RecordId) -> Result<Option<StoredRecord>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM records WHERE id = ?1", RecordRow::COLUMNS),
                params![id],
                RecordRow::from_row,
            )
            .optional()?;
        row.map(StoredRecord::try_from).transpose()
    }

    fn list_records(&self) -> Result<Vec<StoredRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM records ORDER BY id ASC",
            RecordRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map([], RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(StoredRecord::try_from).collect()
    }

    fn update_record(&self, id: RecordId, record: &NewRecord) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE records SET name = ?1, email = ?2, sensitive_data = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                record.name,
                record.email,
                record.sensitive_data,
                now_rfc3339(),
                id
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_record(&self, id: RecordId) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

impl CredentialStore for SqliteStore {
    fn find_admin(&self, email: &str) -> Result<Option<AdminCredential>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM admin WHERE email = ?1", AdminRow::COLUMNS),
                params![email],
                AdminRow::from_row,
            )
            .optional()?;
        row.map(AdminCredential::try_from).transpose()
    }

    fn find_active_admin(&self, email: &str) -> Result<Option<AdminCredential>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM admin WHERE email = ?1 AND is_active = 1",
                    AdminRow::COLUMNS
                ),
                params![email],
                AdminRow::from_row,
            )
            .optional()?;
        row.map(AdminCredential::try_from).transpose()
    }

    fn insert_admin(&self, admin: &NewAdmin) -> Result<AdminId> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO admin (email, password, created_at, is_active) VALUES (?1, ?2, ?3, 1)",
            params![admin.email, admin.password_hash, now_rfc3339()],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                VaultError::Validation("Admin with this email already exists".to_string())
            } else {
                e.into()
            }
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE admin SET last_login = ?1 WHERE id = ?2",
            params![timestamp(at), id],
        )?;
        if changed == 0 {
            return Err(VaultError::NotFound(format!("admin {}", id)));
        }
        Ok(())
    }

    fn set_admin_active(&self, email: &str, active: bool) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE admin SET is_active = ?1 WHERE email = ?2",
            params![active, email],
        )?;
        Ok(changed > 0)
    }

    fn count_admins(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM admin", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            email: format!("{}@x.com", name),
            sensitive_data: "[\"AAAA\"]".to_string(),
        }
    }

    #[test]
    fn test_record_crud() {
        let store = SqliteStore::open_in_memory().unwrap();

        let id = store.insert_record(&record("alice")).unwrap();
        let fetched = store.get_record(id).unwrap().unwrap();
        assert_eq!(fetched.name, "alice");
        assert_eq!(fetched.sensitive_data, "[\"AAAA\"]");

        assert!(store.update_record(id, &record("bob")).unwrap());
        let fetched = store.get_record(id).unwrap().unwrap();
        assert_eq!(fetched.email, "bob@x.com");
        assert!(fetched.updated_at >= fetched.created_at);

        assert!(store.delete_record(id).unwrap());
        assert!(store.get_record(id).unwrap().is_none());
        assert!(!store.delete_record(id).unwrap());
        assert!(!store.update_record(id, &record("carol")).unwrap());
    }

    #[test]
    fn test_list_is_id_ordered() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| store.insert_record(&record(n)).unwrap())
            .collect();
        let listed: Vec<_> = store.list_records().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_corrupt_timestamp_fails_listing_with_record_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_record(&record("a")).unwrap();
        let bad = store.insert_record(&record("b")).unwrap();
        store
            .lock_conn()
            .unwrap()
            .execute(
                "UPDATE records SET updated_at = 'garbage' WHERE id = ?1",
                params![bad],
            )
            .unwrap();

        let err = store.list_records().unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
        assert!(err
            .to_string()
            .contains(&format!("Record {} has a bad updated_at", bad)));
    }

    #[test]
    fn test_admin_lifecycle() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert_admin(&NewAdmin::new("admin@x.com", "$argon2id$hash"))
            .unwrap();
        assert_eq!(store.count_admins().unwrap(), 1);

        let admin = store.find_active_admin("admin@x.com").unwrap().unwrap();
        assert_eq!(admin.id, id);
        assert!(admin.last_login_at.is_none());

        let at = Utc::now();
        store.record_login(id, at).unwrap();
        let admin = store.find_admin("admin@x.com").unwrap().unwrap();
        assert_eq!(
            admin.last_login_at.map(|ts| ts.timestamp_micros()),
            Some(at.timestamp_micros())
        );

        assert!(store.set_admin_active("admin@x.com", false).unwrap());
        assert!(store.find_active_admin("admin@x.com").unwrap().is_none());
        assert!(store.find_admin("admin@x.com").unwrap().is_some());
        assert!(!store.set_admin_active("nobody@x.com", false).unwrap());
    }

    #[test]
    fn test_duplicate_admin_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_admin(&NewAdmin::new("admin@x.com", "h1"))
            .unwrap();
        let err = store
            .insert_admin(&NewAdmin::new("admin@x.com", "h2"))
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("vault.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.check_integrity().unwrap();
            store.insert_record(&record("dana")).unwrap()
        };

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert_eq!(reopened.get_record(id).unwrap().unwrap().name, "dana");
    }
}
