// Project Repository
// Project list persisted as one JSON array. Storage problems are logged and
// never reach the caller.

use std::sync::{Arc, Mutex, MutexGuard};

use super::kv_store::KeyValueStore;
use crate::models::Project;

/// Key the project list is stored under
pub const PROJECTS_KEY: &str = "ragProjects";

/// Repository for project records
/// Clones share one write lock, so appends from concurrent tasks never
/// overwrite each other.
#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// All stored projects, empty on missing or corrupt data
    pub fn load(&self) -> Vec<Project> {
        let raw = match self.store.load(PROJECTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("Failed to load projects: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(projects) => projects,
            Err(e) => {
                log::warn!("Ignoring corrupt project list: {}", e);
                Vec::new()
            }
        }
    }

    /// Replace the stored list (best effort)
    pub fn save(&self, projects: &[Project]) {
        let _guard = self.lock_writes();
        self.write(projects);
    }

    fn write(&self, projects: &[Project]) {
        let raw = match serde_json::to_string(projects) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize projects: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.save(PROJECTS_KEY, &raw) {
            log::error!("Failed to save projects: {}", e);
        }
    }

    /// Append a project unless one with the same id exists. Returns whether it was added.
    pub fn append(&self, project: Project) -> bool {
        let _guard = self.lock_writes();
        let mut projects = self.load();
        if projects.iter().any(|p| p.id == project.id) {
            log::debug!("Project {} already stored", project.id);
            return false;
        }
        projects.push(project);
        self.write(&projects);
        true
    }
}
