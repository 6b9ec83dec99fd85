// Project data models
// A project is an indexed codebase or log file known to the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix appended to the display name of a reindexed project
pub const REINDEXED_NAME_SUFFIX: &str = " (Reindexed)";

/// Suffix the backend uses for rebuilt collections
pub const REBUILT_COLLECTION_SUFFIX: &str = "_rebuilt";

/// Kind of content behind a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Code,
    Log,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Code => write!(f, "code"),
            ProjectType::Log => write!(f, "log"),
        }
    }
}

/// Project record kept in the local store
///
/// Records are append-only: a reindex produces a new record and the original
/// one is left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Identifier of the job that produced this project
    pub id: String,
    /// Display name entered by the user
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Backend-side collection key, may differ from `name`
    pub collection_name: String,
    pub created: DateTime<Utc>,
}

impl Project {
    /// Build the record for a finished ingest job.
    /// The collection falls back to the entered name when the backend omits it.
    pub fn from_ingest(
        job_id: String,
        name: String,
        project_type: ProjectType,
        collection_name: Option<String>,
    ) -> Self {
        let collection_name = collection_name
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| name.clone());

        Self {
            id: job_id,
            name,
            project_type,
            collection_name,
            created: Utc::now(),
        }
    }

    /// Build the record that supersedes `source_name` after a reindex job
    pub fn reindexed(
        job_id: String,
        source_name: &str,
        source_collection: &str,
        collection_name: Option<String>,
    ) -> Self {
        let collection_name = collection_name
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("{}{}", source_collection, REBUILT_COLLECTION_SUFFIX));

        Self {
            id: job_id,
            name: format!("{}{}", source_name, REINDEXED_NAME_SUFFIX),
            project_type: ProjectType::Code,
            collection_name,
            created: Utc::now(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.project_type == ProjectType::Code
    }
}
