// Backend HTTP API Operations
// reqwest implementation of JobApi

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::error::{JobError, JobResult};
use super::types::*;
use super::{JobApi, QaTarget};
use crate::models::{AskResponse, JobKind, JobStatus};

/// HTTP client for the RAG backend
pub struct HttpJobClient {
    client: Client,
    base_url: String,
}

impl HttpJobClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> JobResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| JobError::ConnectionFailed {
                endpoint: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}{}", base, path)
    }

    /// Status path for a job kind
    fn status_path(job_id: &str, kind: JobKind) -> String {
        let id = urlencoding::encode(job_id);
        match kind {
            JobKind::IngestCode => format!("/code/status/{}", id),
            JobKind::IngestLog => format!("/logs/status/{}", id),
            // Reindex jobs report through the analysis status endpoint
            JobKind::Analyze | JobKind::Reindex => format!("/qa/analyze/{}", id),
        }
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> JobResult<Response> {
        let response = request.send().await.map_err(|e| JobError::ConnectionFailed {
            endpoint: path.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::HttpStatus {
                endpoint: path.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(path: &str, response: Response) -> JobResult<T> {
        let text = response.text().await.map_err(|e| JobError::ConnectionFailed {
            endpoint: path.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&text).map_err(|e| JobError::ParseError {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, no_cache: bool) -> JobResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.api_url(path)).json(body);
        if no_cache {
            request = request
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .header(reqwest::header::PRAGMA, "no-cache");
        }
        let response = self.send(path, request).await?;
        Self::parse(path, response).await
    }

    async fn upload(&self, path: &str, file: &Path, project_name: &str) -> JobResult<IngestStarted> {
        let data = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data).file_name(file_name))
            .text("project_name", project_name.to_string());

        log::debug!("Uploading {} to {}", file.display(), path);

        let request = self.client.post(self.api_url(path)).multipart(form);
        let response = self.send(path, request).await?;
        let started: JobStartedResponse = Self::parse(path, response).await?;

        Ok(IngestStarted {
            job_id: started.job_id,
            collection_name: started.collection_name,
        })
    }
}

#[async_trait]
impl JobApi for HttpJobClient {
    async fn start_ingest(&self, source: &IngestSource) -> JobResult<IngestStarted> {
        match source {
            IngestSource::Archive { path, name } => {
                let endpoint = format!("/code/upload/{}", ArchiveFormat::from_path(path).as_str());
                self.upload(&endpoint, path, name).await
            }
            IngestSource::LogFile { path, name } => self.upload("/logs/upload", path, name).await,
            IngestSource::GitHub { url, name } => {
                let payload = GitHubIngestPayload {
                    url: url.clone(),
                    name: name.clone(),
                };
                let started: JobStartedResponse = self.post_json("/code/github", &payload, false).await?;
                Ok(IngestStarted {
                    job_id: started.job_id,
                    collection_name: started.collection_name,
                })
            }
        }
    }

    async fn start_analysis(
        &self,
        collection_name: &str,
        analysis_type: &str,
        file_path: Option<&str>,
    ) -> JobResult<String> {
        let payload = AnalyzePayload {
            collection_name,
            analysis_type,
            file_path,
        };
        let started: JobStartedResponse = self.post_json("/qa/analyze", &payload, true).await?;
        Ok(started.job_id)
    }

    async fn start_reindex(&self, collection_name: &str) -> JobResult<String> {
        let payload = ReindexPayload { collection_name };
        let started: JobStartedResponse = self.post_json("/qa/reindex", &payload, true).await?;
        Ok(started.job_id)
    }

    async fn get_status(&self, job_id: &str, kind: JobKind) -> JobResult<JobStatus> {
        let path = Self::status_path(job_id, kind);
        let mut request = self.client.get(self.api_url(&path));

        if matches!(kind, JobKind::Analyze | JobKind::Reindex) {
            // Intermediaries must not serve a stale status
            let stamp = chrono::Utc::now().timestamp_millis().to_string();
            request = request
                .query(&[("_", stamp)])
                .header(reqwest::header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
                .header(reqwest::header::PRAGMA, "no-cache")
                .header(reqwest::header::EXPIRES, "0");
        }

        let response = self.send(&path, request).await?;
        Self::parse(&path, response).await
    }

    async fn ask(
        &self,
        target: QaTarget,
        collection_name: &str,
        question: &str,
    ) -> JobResult<AskResponse> {
        let path = match target {
            QaTarget::Code => "/qa/question",
            QaTarget::Log => "/logs/question",
        };
        let payload = QuestionPayload {
            collection_name,
            question,
        };
        self.post_json(path, &payload, false).await
    }
}

/// Default project name for a GitHub URL: the last path segment, without `.git`
pub fn github_repo_name(repo_url: &str) -> Option<String> {
    let parsed = url::Url::parse(repo_url.trim()).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();
    let name = segment.strip_suffix(".git").unwrap_or(&segment);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
