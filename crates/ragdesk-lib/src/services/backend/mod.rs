// Backend Job Client Module
//
// This module provides:
// - JobApi trait, the seam between the pollers and the RAG backend
// - HttpJobClient, the reqwest implementation
// - Job error taxonomy and request/response payloads

pub mod api;
pub mod error;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use api::{github_repo_name, HttpJobClient};
pub use error::{JobError, JobErrorCode, JobResult};
pub use types::{ArchiveFormat, IngestSource, IngestStarted};

use crate::models::{AskResponse, JobKind, JobStatus, ProjectType};

/// QA endpoint family a question is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaTarget {
    /// `/qa/question`, also used for free conversation
    Code,
    /// `/logs/question`
    Log,
}

impl From<ProjectType> for QaTarget {
    fn from(project_type: ProjectType) -> Self {
        match project_type {
            ProjectType::Code => QaTarget::Code,
            ProjectType::Log => QaTarget::Log,
        }
    }
}

/// Operations offered by the RAG backend.
/// Each call is a single request; retries and scheduling belong to the pollers.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Upload or register content, returning the accepted ingest job
    async fn start_ingest(&self, source: &IngestSource) -> JobResult<IngestStarted>;

    /// Start a code analysis job on a collection
    async fn start_analysis(
        &self,
        collection_name: &str,
        analysis_type: &str,
        file_path: Option<&str>,
    ) -> JobResult<String>;

    /// Start rebuilding a collection in the current index format
    async fn start_reindex(&self, collection_name: &str) -> JobResult<String>;

    /// Fetch the current status of a job
    async fn get_status(&self, job_id: &str, kind: JobKind) -> JobResult<JobStatus>;

    /// Ask a question against a collection (empty collection = free conversation)
    async fn ask(
        &self,
        target: QaTarget,
        collection_name: &str,
        question: &str,
    ) -> JobResult<AskResponse>;
}

/// Shared job client handle
pub type SharedJobApi = Arc<dyn JobApi>;

/// Factory function to create the HTTP job client
pub fn create_client(base_url: &str, timeout_secs: u64) -> JobResult<SharedJobApi> {
    Ok(Arc::new(HttpJobClient::new(base_url, timeout_secs)?))
}
