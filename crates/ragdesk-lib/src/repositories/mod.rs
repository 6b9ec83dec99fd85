// Repository Layer
// Data access for the local store

pub mod kv_store;
pub mod project_repo;
pub mod settings_repo;

pub use kv_store::{KeyValueStore, MemoryStore};
pub use project_repo::{ProjectRepository, PROJECTS_KEY};
pub use settings_repo::SettingsRepository;
