// Settings Repository
// Key-value rows of the settings table

use rusqlite::{params, OptionalExtension};

use super::kv_store::KeyValueStore;
use crate::utils::database::Database;

/// Repository for the settings table
#[derive(Clone)]
pub struct SettingsRepository {
    db: Database,
}

impl SettingsRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value
    pub fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.db.with_connection(|conn| {
            conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Failed to read setting {}: {}", key, e))
        })
    }

    /// Insert or replace a setting value
    pub fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO settings (key, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                params![key, value],
            )
            .map_err(|e| format!("Failed to save setting {}: {}", key, e))?;
            Ok(())
        })
    }
}

impl KeyValueStore for SettingsRepository {
    fn load(&self, key: &str) -> Result<Option<String>, String> {
        self.get(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), String> {
        self.set(key, value)
    }
}
