//! Raw row types for database queries.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::error::{Result, VaultError};
use crate::storage::types::{AdminCredential, StoredRecord};

/// Raw row data from the records table, before parsing into domain types.
#[derive(Debug)]
pub struct RecordRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub sensitive_data: String,
    pub created_at: String,
    pub updated_at: String,
}

impl RecordRow {
    pub const COLUMNS: &'static str = "id, name, email, sensitive_data, created_at, updated_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            sensitive_data: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = VaultError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let stamp = |column: &str, value: &str| {
            parse_timestamp(value).map_err(|e| {
                VaultError::Storage(format!("Record {} has a bad {}: {}", row.id, column, e))
            })
        };
        let created_at = stamp("created_at", &row.created_at)?;
        let updated_at = stamp("updated_at", &row.updated_at)?;

        Ok(StoredRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            sensitive_data: row.sensitive_data,
            created_at,
            updated_at,
        })
    }
}

/// Raw row data from the admin table.
pub struct AdminRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl AdminRow {
    pub const COLUMNS: &'static str = "id, email, password, is_active, created_at, last_login";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            is_active: row.get(3)?,
            created_at: row.get(4)?,
            last_login: row.get(5)?,
        })
    }
}

impl TryFrom<AdminRow> for AdminCredential {
    type Error = VaultError;

    fn try_from(row: AdminRow) -> Result<Self> {
        let last_login_at = row
            .last_login
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(AdminCredential {
            id: row.id,
            email: row.email,
            password_hash: row.password,
            is_active: row.is_active,
            created_at: parse_timestamp(&row.created_at)?,
            last_login_at,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| VaultError::Storage(format!("Invalid timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_timestamp_rejected() {
        let row = RecordRow {
            id: 1,
            name: "n".to_string(),
            email: "e@x.com".to_string(),
            sensitive_data: "[]".to_string(),
            created_at: "yesterday".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let err = StoredRecord::try_from(row).unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
        assert!(err.to_string().contains("Record 1 has a bad created_at"));
    }

    #[test]
    fn test_admin_row_without_login() {
        let row = AdminRow {
            id: 7,
            email: "admin@x.com".to_string(),
            password: "$argon2id$...".to_string(),
            is_active: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            last_login: None,
        };
        let admin = AdminCredential::try_from(row).unwrap();
        assert_eq!(admin.id, 7);
        assert!(admin.last_login_at.is_none());
    }
}
