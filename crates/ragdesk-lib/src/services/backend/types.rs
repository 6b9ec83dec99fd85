// Backend API Types
// Request and response payloads for the RAG backend

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::ProjectType;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GitHubIngestPayload {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionPayload<'a> {
    pub collection_name: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AnalyzePayload<'a> {
    pub collection_name: &'a str,
    pub analysis_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ReindexPayload<'a> {
    pub collection_name: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

/// Response of every endpoint that starts a job
#[derive(Debug, Clone, Deserialize)]
pub struct JobStartedResponse {
    pub job_id: String,
    #[serde(default)]
    pub collection_name: Option<String>,
}

/// Accepted ingest job
#[derive(Debug, Clone, PartialEq)]
pub struct IngestStarted {
    pub job_id: String,
    pub collection_name: Option<String>,
}

// ============================================================================
// Ingest sources
// ============================================================================

/// Archive format accepted by the code upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Rar,
}

impl ArchiveFormat {
    /// Zip when the file name ends with `.zip`, rar otherwise
    pub fn from_path(path: &std::path::Path) -> Self {
        let is_zip = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase().ends_with(".zip"))
            .unwrap_or(false);
        if is_zip {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::Rar
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Rar => "rar",
        }
    }
}

/// Where the content of a new project comes from
#[derive(Debug, Clone, PartialEq)]
pub enum IngestSource {
    /// Zip or rar archive of a codebase
    Archive { path: PathBuf, name: String },
    /// Public GitHub repository
    GitHub { url: String, name: String },
    /// Single log file
    LogFile { path: PathBuf, name: String },
}

impl IngestSource {
    pub fn project_type(&self) -> ProjectType {
        match self {
            IngestSource::LogFile { .. } => ProjectType::Log,
            _ => ProjectType::Code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            IngestSource::Archive { name, .. }
            | IngestSource::GitHub { name, .. }
            | IngestSource::LogFile { name, .. } => name,
        }
    }
}
