// Scripted JobApi for poller and controller tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

use crate::models::{AskResponse, JobKind, JobStatus};
use crate::services::backend::{IngestSource, IngestStarted, JobApi, JobError, JobResult, QaTarget};

#[derive(Debug, Clone)]
pub enum Step {
    Status(JobStatus),
    HttpError(u16),
    Unreachable,
}

pub fn pending(percentage: f64, stage: &str) -> JobStatus {
    serde_json::from_value(json!({
        "status": "processing",
        "message": "Working",
        "details": { "progress_percentage": percentage, "current_stage": stage }
    }))
    .unwrap()
}

pub fn completed(collection_name: Option<&str>) -> JobStatus {
    serde_json::from_value(json!({
        "status": "completed",
        "message": "Done",
        "collection_name": collection_name
    }))
    .unwrap()
}

pub fn failed(message: &str) -> JobStatus {
    serde_json::from_value(json!({ "status": "failed", "message": message })).unwrap()
}

/// Status checks replay the script in order; the last step repeats forever.
pub struct ScriptedApi {
    steps: Mutex<VecDeque<Step>>,
    status_times: Mutex<Vec<Instant>>,
    started: Mutex<Vec<(JobKind, String)>>,
    asked: Mutex<Vec<(QaTarget, String, String)>>,
    next_id: AtomicU32,
    pub ingest_collection: Mutex<Option<String>>,
}

impl ScriptedApi {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            status_times: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            asked: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
            ingest_collection: Mutex::new(None),
        }
    }

    pub fn repeating(step: Step) -> Self {
        Self::new(vec![step])
    }

    /// Replace the remaining script
    pub fn script(&self, steps: Vec<Step>) {
        *self.steps.lock().unwrap() = steps.into();
    }

    pub fn status_calls(&self) -> usize {
        self.status_times.lock().unwrap().len()
    }

    pub fn status_times(&self) -> Vec<Instant> {
        self.status_times.lock().unwrap().clone()
    }

    /// Jobs started so far: kind and collection (or project name for ingest)
    pub fn started(&self) -> Vec<(JobKind, String)> {
        self.started.lock().unwrap().clone()
    }

    pub fn asked(&self) -> Vec<(QaTarget, String, String)> {
        self.asked.lock().unwrap().clone()
    }

    fn next_job_id(&self) -> String {
        format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap_or(Step::Unreachable)
        }
    }
}

#[async_trait]
impl JobApi for ScriptedApi {
    async fn start_ingest(&self, source: &IngestSource) -> JobResult<IngestStarted> {
        let kind = JobKind::ingest_for(source.project_type());
        self.started
            .lock()
            .unwrap()
            .push((kind, source.name().to_string()));
        Ok(IngestStarted {
            job_id: self.next_job_id(),
            collection_name: self.ingest_collection.lock().unwrap().clone(),
        })
    }

    async fn start_analysis(
        &self,
        collection_name: &str,
        _analysis_type: &str,
        _file_path: Option<&str>,
    ) -> JobResult<String> {
        self.started
            .lock()
            .unwrap()
            .push((JobKind::Analyze, collection_name.to_string()));
        Ok(self.next_job_id())
    }

    async fn start_reindex(&self, collection_name: &str) -> JobResult<String> {
        self.started
            .lock()
            .unwrap()
            .push((JobKind::Reindex, collection_name.to_string()));
        Ok(self.next_job_id())
    }

    async fn get_status(&self, job_id: &str, _kind: JobKind) -> JobResult<JobStatus> {
        self.status_times.lock().unwrap().push(Instant::now());
        match self.next_step() {
            Step::Status(status) => Ok(status),
            Step::HttpError(status) => Err(JobError::HttpStatus {
                endpoint: format!("/status/{}", job_id),
                status,
                body: "scripted failure".to_string(),
            }),
            Step::Unreachable => Err(JobError::ConnectionFailed {
                endpoint: format!("/status/{}", job_id),
                message: "connection refused".to_string(),
            }),
        }
    }

    async fn ask(
        &self,
        target: QaTarget,
        collection_name: &str,
        question: &str,
    ) -> JobResult<AskResponse> {
        self.asked.lock().unwrap().push((
            target,
            collection_name.to_string(),
            question.to_string(),
        ));
        Ok(AskResponse {
            answer: format!("answer to {}", question),
            sources: Some(vec!["src/main.rs".to_string()]),
            is_conversation: collection_name.is_empty(),
        })
    }
}
