// Client configuration
// Defaults, optional TOML file and environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::JobKind;
use crate::services::poller::policy::{
    BlockingPolicy, ResilientPolicy, BACKGROUND_MAX_ATTEMPTS, BACKGROUND_POLL_INTERVAL_MS,
    INGEST_MAX_ATTEMPTS, INGEST_POLL_INTERVAL_MS, MAX_CONSECUTIVE_ERRORS,
};
use crate::utils::database::{open_database, Database};
use crate::utils::shared_store::get_app_data_dir;

/// Config file looked up in the app data directory
pub const CONFIG_FILE: &str = "ragdesk.toml";

pub const ENV_API_URL: &str = "RAGDESK_API_URL";
pub const ENV_DB_PATH: &str = "RAGDESK_DB_PATH";
pub const ENV_REQUEST_TIMEOUT: &str = "RAGDESK_REQUEST_TIMEOUT_SECS";

fn default_api_base_url() -> String {
    String::from("http://127.0.0.1:8000/api")
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ingest_poll_interval_ms() -> u64 {
    INGEST_POLL_INTERVAL_MS
}

fn default_ingest_max_attempts() -> u32 {
    INGEST_MAX_ATTEMPTS
}

fn default_background_poll_interval_ms() -> u64 {
    BACKGROUND_POLL_INTERVAL_MS
}

fn default_background_max_attempts() -> u32 {
    BACKGROUND_MAX_ATTEMPTS
}

fn default_max_consecutive_errors() -> u32 {
    MAX_CONSECUTIVE_ERRORS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Backend API root, endpoint paths are appended to it
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// SQLite file holding settings and projects (default: app data dir)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ingest_poll_interval_ms")]
    pub ingest_poll_interval_ms: u64,
    #[serde(default = "default_ingest_max_attempts")]
    pub ingest_max_attempts: u32,
    #[serde(default = "default_background_poll_interval_ms")]
    pub background_poll_interval_ms: u64,
    #[serde(default = "default_background_max_attempts")]
    pub background_max_attempts: u32,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            database_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            ingest_poll_interval_ms: default_ingest_poll_interval_ms(),
            ingest_max_attempts: default_ingest_max_attempts(),
            background_poll_interval_ms: default_background_poll_interval_ms(),
            background_max_attempts: default_background_max_attempts(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl ClientConfig {
    /// Load configuration: defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist. Without one, `ragdesk.toml` in the app
    /// data directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match get_app_data_dir().map(|dir| dir.join(CONFIG_FILE)) {
                Ok(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|e| format!("Invalid {}: {}", ENV_REQUEST_TIMEOUT, e))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.api_base_url)
            .map_err(|e| format!("Invalid api_base_url '{}': {}", self.api_base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("api_base_url must be http(s): {}", self.api_base_url));
        }

        let positive = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("ingest_poll_interval_ms", self.ingest_poll_interval_ms),
            ("ingest_max_attempts", u64::from(self.ingest_max_attempts)),
            ("background_poll_interval_ms", self.background_poll_interval_ms),
            ("background_max_attempts", u64::from(self.background_max_attempts)),
            ("max_consecutive_errors", u64::from(self.max_consecutive_errors)),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(format!("{} must be greater than zero", name));
            }
        }
        Ok(())
    }

    /// Open the configured database, falling back to the app data directory
    pub fn open_database(&self) -> Result<Database, String> {
        open_database(self.database_path.as_deref())
    }

    pub fn ingest_policy(&self) -> BlockingPolicy {
        BlockingPolicy {
            interval: Duration::from_millis(self.ingest_poll_interval_ms),
            max_attempts: self.ingest_max_attempts,
        }
    }

    pub fn background_policy(&self, kind: JobKind) -> ResilientPolicy {
        ResilientPolicy {
            interval: Duration::from_millis(self.background_poll_interval_ms),
            max_attempts: self.background_max_attempts,
            max_consecutive_errors: self.max_consecutive_errors,
            ..ResilientPolicy::for_kind(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_policies() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingest_policy(), BlockingPolicy::default());
        assert_eq!(
            config.background_policy(JobKind::Reindex),
            ResilientPolicy::for_kind(JobKind::Reindex)
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_base_url = "https://rag.internal/api"
            background_poll_interval_ms = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://rag.internal/api");
        assert_eq!(config.background_poll_interval_ms, 5000);
        assert_eq!(config.ingest_max_attempts, 60);
        assert_eq!(config.database_path, None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://10.0.0.5:9000/api"),
            (ENV_DB_PATH, "/tmp/ragdesk.db"),
            (ENV_REQUEST_TIMEOUT, "5"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://10.0.0.5:9000/api");
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/ragdesk.db")));
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ClientConfig::default();
        assert!(config.apply_env(|_| Some("soon".to_string())).is_err());

        let config = ClientConfig {
            ingest_max_attempts: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("ingest_max_attempts"));

        let config = ClientConfig {
            api_base_url: "localhost:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragdesk.toml");
        std::fs::write(&path, "max_consecutive_errors = 5\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.max_consecutive_errors, 5);
        assert!(ClientConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_open_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            database_path: Some(dir.path().join("data").join("ragdesk.db")),
            ..ClientConfig::default()
        };

        let db = config.open_database().unwrap();
        assert_eq!(db.path(), dir.path().join("data").join("ragdesk.db").as_path());
    }
}
