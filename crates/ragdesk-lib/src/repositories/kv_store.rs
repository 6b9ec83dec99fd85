// Key-Value Store
// Durable string storage behind the project store

use std::collections::HashMap;
use std::sync::Mutex;

/// Durable key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, `None` when absent
    fn load(&self, key: &str) -> Result<Option<String>, String>;

    fn save(&self, key: &str, value: &str) -> Result<(), String>;
}

/// Process-local store, used by tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, String> {
        let values = self
            .values
            .lock()
            .map_err(|e| format!("Failed to acquire store lock: {}", e))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), String> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| format!("Failed to acquire store lock: {}", e))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
