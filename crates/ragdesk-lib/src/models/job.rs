// Job data models
// Server-side asynchronous work (ingest, analysis, reindex) and its polled status

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::project::ProjectType;

/// Stage shown while the backend has not reported one
pub const DEFAULT_STAGE: &str = "Processing";

/// Kind of server-side job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    IngestCode,
    IngestLog,
    Analyze,
    Reindex,
}

impl JobKind {
    /// Ingest kind for a project type
    pub fn ingest_for(project_type: ProjectType) -> Self {
        match project_type {
            ProjectType::Code => JobKind::IngestCode,
            ProjectType::Log => JobKind::IngestLog,
        }
    }

    /// Human label used in log lines and messages
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::IngestCode => "Processing",
            JobKind::IngestLog => "Log processing",
            JobKind::Analyze => "Analysis",
            JobKind::Reindex => "Reindexing",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::IngestCode => write!(f, "ingest-code"),
            JobKind::IngestLog => write!(f, "ingest-log"),
            JobKind::Analyze => write!(f, "analyze"),
            JobKind::Reindex => write!(f, "reindex"),
        }
    }
}

/// Status reported by the backend for a job.
/// Anything that is not a terminal state (`processing`, `pending`, ...) is Pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Completed,
    CompletedWithErrors,
    Failed,
    #[serde(other)]
    Pending,
}

impl JobState {
    /// `completed`, or `completed_with_errors` when no remediation applies
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::Completed | JobState::CompletedWithErrors)
    }
}

/// Progress details attached to a status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusDetails {
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub files_processed: Option<u64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Automatic analysis produced for uploaded log files
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub patterns: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

impl LogAnalysis {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.errors.is_empty()
            && self.patterns.is_none()
            && self.recommendations.is_none()
    }
}

/// Polled status of a job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<StatusDetails>,
    /// Issue name -> finding text (analysis jobs)
    #[serde(default)]
    pub findings: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub collection_name: Option<String>,
    /// Automatic log analysis (log ingest jobs)
    #[serde(default)]
    pub analysis: Option<LogAnalysis>,
}

/// Progress snapshot pushed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percentage: f64,
    pub stage: String,
}

impl JobStatus {
    /// Progress with 0 / "Processing" defaults when the backend omits details
    pub fn progress(&self) -> Progress {
        let details = self.details.as_ref();
        Progress {
            percentage: details
                .and_then(|d| d.progress_percentage)
                .unwrap_or(0.0),
            stage: details
                .and_then(|d| d.current_stage.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
        }
    }

    /// Non-fatal issues the backend recorded while running the job
    pub fn detail_errors(&self) -> &[String] {
        self.details
            .as_ref()
            .map(|d| d.errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn findings(&self) -> impl Iterator<Item = (&String, &String)> {
        self.findings.iter().flat_map(|f| f.iter())
    }
}
