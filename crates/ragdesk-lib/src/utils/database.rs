// SQLite Database Connection Management
// Local store for client settings and the project list

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;
use super::shared_store::get_app_data_dir;

/// Database file name
#[cfg(debug_assertions)]
pub const DATABASE_FILE: &str = "ragdesk-dev.db";

#[cfg(not(debug_assertions))]
pub const DATABASE_FILE: &str = "ragdesk.db";

/// Thread-safe database wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database, enable WAL mode and run migrations
    pub fn new(path: PathBuf) -> Result<Self, String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create database directory: {}", e))?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| format!("Failed to open database: {}", e))?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=5000;
            PRAGMA synchronous=NORMAL;
            "#,
        )
        .map_err(|e| format!("Failed to configure database: {}", e))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// In-memory database, used when no data directory is available
    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|e| format!("Failed to open database: {}", e))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a lock on the connection for executing queries
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|e| format!("Failed to acquire database lock: {}", e))
    }

    fn run_migrations(&self) -> Result<(), String> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    /// Execute a function with the database connection
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, String>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    pub fn schema_version(&self) -> Result<i32, String> {
        self.with_connection(schema::get_version)
    }
}

/// Get the default database path
pub fn get_database_path() -> Result<PathBuf, String> {
    get_app_data_dir().map(|dir| dir.join(DATABASE_FILE))
}

/// Open the database at `path`, or at the default location.
/// Without a usable data directory the store lives in memory for this run.
pub fn open_database(path: Option<&Path>) -> Result<Database, String> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match get_database_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{}; projects will not be persisted", e);
                return Database::in_memory();
            }
        },
    };
    log::debug!("Opening database at {}", path.display());
    Database::new(path)
}
