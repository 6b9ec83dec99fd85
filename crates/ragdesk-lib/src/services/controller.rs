// Application Controller
// Owns the client state (projects, selection, in-flight work) and drives the
// job client, pollers and dispatcher on behalf of a front end.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ClientConfig;
use crate::models::{ChatReply, JobKind, JobState, LogAnalysis, Project, ProjectType};
use crate::repositories::ProjectRepository;
use crate::services::backend::{IngestSource, JobError, JobResult, SharedJobApi};
use crate::services::dispatcher::ConversationDispatcher;
use crate::services::poller::{
    poll_until_complete, run_resilient, PollEvent, PollEventSink, PollOutcome, PollSlot,
    PollTarget, ReindexAction, SessionHandle, SessionRegistry,
};
use crate::utils::shared_store::{validate_project_name, validate_repo_url};

/// Client state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub projects: Vec<Project>,
    /// Id of the selected project
    pub current_project: Option<String>,
    /// An ingest job is running
    pub processing: bool,
    /// Most recent background session that timed out
    pub suspended: Option<PollTarget>,
}

/// Result of the log analysis view
#[derive(Debug, Clone, PartialEq)]
pub enum LogReport {
    /// Automatic analysis produced at upload time
    Analysis(LogAnalysis),
    NoAnalysis,
    /// Answer to a question about the logs
    Answer(ChatReply),
}

type SharedState = Arc<Mutex<AppState>>;

fn lock_state(state: &Mutex<AppState>) -> MutexGuard<'_, AppState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clears the processing flag when the ingest ends, however it ends
struct ProcessingGuard {
    state: SharedState,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        lock_state(&self.state).processing = false;
    }
}

pub struct AppController {
    api: SharedJobApi,
    store: ProjectRepository,
    sessions: SessionRegistry,
    sink: Arc<dyn PollEventSink>,
    config: ClientConfig,
    state: SharedState,
}

impl AppController {
    pub fn new(
        api: SharedJobApi,
        store: ProjectRepository,
        sink: Arc<dyn PollEventSink>,
        config: ClientConfig,
    ) -> Self {
        let projects = store.load();
        log::debug!("Loaded {} projects", projects.len());

        Self {
            api,
            store,
            sessions: SessionRegistry::new(),
            sink,
            config,
            state: Arc::new(Mutex::new(AppState {
                projects,
                ..AppState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        lock_state(&self.state)
    }

    /// Snapshot of the client state
    pub fn snapshot(&self) -> AppState {
        self.state().clone()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state().projects.clone()
    }

    pub fn current_project(&self) -> Option<Project> {
        let state = self.state();
        let id = state.current_project.as_ref()?;
        state.projects.iter().find(|p| &p.id == id).cloned()
    }

    pub fn select_project(&self, id: &str) -> JobResult<Project> {
        let mut state = self.state();
        let project = state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| JobError::ProjectNotFound { id: id.to_string() })?;
        state.current_project = Some(project.id.clone());
        Ok(project)
    }

    pub fn clear_selection(&self) {
        self.state().current_project = None;
    }

    fn require_project(&self, project_type: ProjectType) -> JobResult<Project> {
        let project = self.current_project().ok_or(JobError::NoProjectSelected)?;
        if project.project_type != project_type {
            return Err(JobError::WrongProjectType {
                expected: project_type.to_string(),
            });
        }
        Ok(project)
    }

    /// Ingest new content and wait for it to be indexed.
    /// The new project is stored and selected.
    pub async fn add_project(&self, source: IngestSource) -> JobResult<Project> {
        validate_project_name(source.name()).map_err(|message| JobError::InvalidInput { message })?;
        if let IngestSource::GitHub { url, .. } = &source {
            validate_repo_url(url).map_err(|message| JobError::InvalidInput { message })?;
        }

        let _guard = {
            let mut state = self.state();
            if state.processing {
                return Err(JobError::Busy {
                    operation: "Processing".to_string(),
                });
            }
            state.processing = true;
            ProcessingGuard {
                state: Arc::clone(&self.state),
            }
        };

        let project_type = source.project_type();
        let kind = JobKind::ingest_for(project_type);

        let started = self.api.start_ingest(&source).await?;
        log::info!("Started {} job {} for {}", kind, started.job_id, source.name());

        let status = poll_until_complete(
            self.api.as_ref(),
            &started.job_id,
            kind,
            &self.config.ingest_policy(),
            self.sink.as_ref(),
        )
        .await?;

        let collection_name = started
            .collection_name
            .filter(|c| !c.is_empty())
            .or(status.collection_name);
        let project = Project::from_ingest(
            started.job_id,
            source.name().to_string(),
            project_type,
            collection_name,
        );

        add_and_select(&self.store, &self.state, self.sink.as_ref(), project.clone());
        Ok(project)
    }

    /// Start a code analysis of the selected project.
    /// Any analysis session already running is cancelled first.
    pub async fn analyze_code(
        &self,
        analysis_type: &str,
        file_path: Option<&str>,
    ) -> JobResult<SessionHandle> {
        let project = self.require_project(ProjectType::Code)?;
        if analysis_type.trim().is_empty() {
            return Err(JobError::InvalidInput {
                message: "Analysis type cannot be empty".to_string(),
            });
        }

        if self.sessions.cancel_slot(PollSlot::AnalysisStatus) {
            log::info!("Replacing running analysis session");
        }

        let file_path = file_path.map(str::trim).filter(|p| !p.is_empty());
        let job_id = self
            .api
            .start_analysis(&project.collection_name, analysis_type, file_path)
            .await?;
        log::info!("Started analysis job {} on {}", job_id, project.collection_name);

        Ok(self.spawn_session(PollTarget {
            job_id,
            kind: JobKind::Analyze,
            collection_name: project.collection_name,
            project_name: project.name,
        }))
    }

    /// Rebuild a collection flagged by an analysis
    pub async fn reindex(&self, action: ReindexAction) -> JobResult<SessionHandle> {
        if action.collection_name.trim().is_empty() {
            return Err(JobError::InvalidInput {
                message: "Collection name cannot be empty".to_string(),
            });
        }

        let job_id = self.api.start_reindex(&action.collection_name).await?;
        log::info!("Started reindex job {} for {}", job_id, action.collection_name);

        Ok(self.spawn_session(PollTarget {
            job_id,
            kind: JobKind::Reindex,
            collection_name: action.collection_name,
            project_name: action.project_name,
        }))
    }

    /// Resume the most recent timed out session with a fresh attempt budget
    pub fn check_again(&self) -> JobResult<SessionHandle> {
        let target = self.state().suspended.take().ok_or_else(|| JobError::NotReady {
            message: "No timed out job to check again".to_string(),
        })?;
        log::info!("Checking {} job {} again", target.kind, target.job_id);
        Ok(self.spawn_session(target))
    }

    pub fn cancel_analysis(&self) -> bool {
        self.sessions.cancel_slot(PollSlot::AnalysisStatus)
    }

    /// Cancel every background session
    pub fn shutdown(&self) {
        self.sessions.cancel_all();
    }

    /// Ask a question about the selected project, or chat freely without one
    pub async fn ask(&self, question: &str) -> JobResult<ChatReply> {
        let project = self.current_project();
        ConversationDispatcher::new(self.api.as_ref())
            .ask(project.as_ref(), question)
            .await
    }

    /// Analysis of the selected log project, or an answer to `query` about it
    pub async fn log_analysis(&self, query: Option<&str>) -> JobResult<LogReport> {
        let project = self.require_project(ProjectType::Log)?;

        let status = self.api.get_status(&project.id, JobKind::IngestLog).await?;
        if status.status != JobState::Completed {
            return Err(JobError::NotReady {
                message: "Log processing is not yet complete".to_string(),
            });
        }

        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let reply = ConversationDispatcher::new(self.api.as_ref())
                .ask(Some(&project), query)
                .await?;
            return Ok(LogReport::Answer(reply));
        }

        Ok(match status.analysis.filter(|a| !a.is_empty()) {
            Some(analysis) => LogReport::Analysis(analysis),
            None => LogReport::NoAnalysis,
        })
    }

    fn spawn_session(&self, target: PollTarget) -> SessionHandle {
        {
            // A fresh session supersedes a suspended one for the same slot
            let mut state = self.state();
            if state.suspended.as_ref().map(|s| PollSlot::for_kind(s.kind))
                == Some(PollSlot::for_kind(target.kind))
            {
                state.suspended = None;
            }
        }

        let api = Arc::clone(&self.api);
        let sink = Arc::clone(&self.sink);
        let state = Arc::clone(&self.state);
        let store = self.store.clone();
        let policy = self.config.background_policy(target.kind);
        let slot = PollSlot::for_kind(target.kind);
        let job_id = target.job_id.clone();
        let kind = target.kind;

        let session = async move {
            let outcome = run_resilient(api, target.clone(), policy, Arc::clone(&sink)).await;

            match &outcome {
                PollOutcome::TimedOut { attempts } => {
                    // Resumable before anyone hears about it
                    lock_state(&state).suspended = Some(target.clone());
                    sink.emit(PollEvent::TimedOut {
                        job_id: target.job_id.clone(),
                        kind: target.kind,
                        attempts: *attempts,
                    });
                }
                PollOutcome::Succeeded(status) if target.kind == JobKind::Reindex => {
                    let project = Project::reindexed(
                        target.job_id.clone(),
                        &target.project_name,
                        &target.collection_name,
                        status.collection_name.clone(),
                    );
                    add_and_select(&store, &state, sink.as_ref(), project);
                }
                _ => {}
            }

            outcome
        };

        self.sessions.start(slot, &job_id, kind, session)
    }
}

/// Persist a new project, select it and announce it
fn add_and_select(
    store: &ProjectRepository,
    state: &Mutex<AppState>,
    sink: &dyn PollEventSink,
    project: Project,
) {
    store.append(project.clone());
    {
        let mut state = lock_state(state);
        if !state.projects.iter().any(|p| p.id == project.id) {
            state.projects.push(project.clone());
        }
        state.current_project = Some(project.id.clone());
    }
    log::info!("Added project {} ({})", project.name, project.collection_name);
    sink.emit(PollEvent::ProjectAdded { project });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{KeyValueStore, MemoryStore};
    use crate::services::backend::QaTarget;
    use crate::services::poller::testing::{completed, pending, ScriptedApi, Step};
    use crate::services::poller::ChannelSink;
    use crate::models::JobStatus;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        api: Arc<ScriptedApi>,
        store: Arc<MemoryStore>,
        controller: Arc<AppController>,
        events: UnboundedReceiver<PollEvent>,
    }

    fn fixture(steps: Vec<Step>, projects: &[Project], config: ClientConfig) -> Fixture {
        let api = Arc::new(ScriptedApi::new(steps));
        let store = Arc::new(MemoryStore::new());
        let repo = ProjectRepository::new(store.clone());
        repo.save(projects);
        let (sink, events) = ChannelSink::new();

        let controller = Arc::new(AppController::new(
            api.clone(),
            repo,
            Arc::new(sink),
            config,
        ));
        Fixture {
            api,
            store,
            controller,
            events,
        }
    }

    fn code_project() -> Project {
        Project::from_ingest(
            "job-0".to_string(),
            "billing".to_string(),
            ProjectType::Code,
            Some("billing_c".to_string()),
        )
    }

    fn log_project() -> Project {
        Project::from_ingest(
            "log-0".to_string(),
            "nginx".to_string(),
            ProjectType::Log,
            Some("nginx_l".to_string()),
        )
    }

    fn github(name: &str) -> IngestSource {
        IngestSource::GitHub {
            url: format!("https://github.com/acme/{}", name),
            name: name.to_string(),
        }
    }

    fn stored_projects(store: &MemoryStore) -> Vec<Project> {
        let raw = store.load(crate::repositories::PROJECTS_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_project_uses_final_status_collection() {
        let mut f = fixture(
            vec![
                Step::Status(pending(30.0, "Cloning")),
                Step::Status(completed(Some("api_9a"))),
            ],
            &[],
            ClientConfig::default(),
        );

        let project = f.controller.add_project(github("api")).await.unwrap();

        assert_eq!(project.id, "job-1");
        assert_eq!(project.collection_name, "api_9a");
        assert_eq!(f.controller.current_project(), Some(project.clone()));
        assert_eq!(stored_projects(&f.store), vec![project.clone()]);
        assert!(!f.controller.snapshot().processing);

        let mut added = false;
        while let Ok(event) = f.events.try_recv() {
            if let PollEvent::ProjectAdded { project: p } = event {
                assert_eq!(p, project);
                added = true;
            }
        }
        assert!(added);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_collection_wins() {
        let f = fixture(
            vec![Step::Status(completed(Some("from_status")))],
            &[],
            ClientConfig::default(),
        );
        *f.api.ingest_collection.lock().unwrap() = Some("from_upload".to_string());

        let project = f.controller.add_project(github("api")).await.unwrap();
        assert_eq!(project.collection_name, "from_upload");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_ingest_is_busy() {
        let f = fixture(
            vec![Step::Status(pending(10.0, "Indexing"))],
            &[],
            ClientConfig::default(),
        );

        let controller = Arc::clone(&f.controller);
        let first = tokio::spawn(async move { controller.add_project(github("api")).await });
        tokio::time::sleep(Duration::from_millis(500)).await;

        let err = f.controller.add_project(github("web")).await.unwrap_err();
        assert!(matches!(err, JobError::Busy { .. }));

        // The first ingest times out and releases the flag
        let err = first.await.unwrap().unwrap_err();
        assert!(matches!(err, JobError::JobTimedOut { .. }));
        assert!(!f.controller.snapshot().processing);
        assert!(f.controller.projects().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ingest_adds_nothing() {
        let f = fixture(
            vec![Step::Status(crate::services::poller::testing::failed("Clone failed"))],
            &[],
            ClientConfig::default(),
        );

        let err = f.controller.add_project(github("api")).await.unwrap_err();
        assert_eq!(err.to_string(), "Processing failed: Clone failed");
        assert!(f.controller.projects().is_empty());
        assert!(f.controller.current_project().is_none());
    }

    #[tokio::test]
    async fn test_analysis_requires_code_project() {
        let f = fixture(Vec::new(), &[log_project()], ClientConfig::default());

        let err = f.controller.analyze_code("bugs", None).await.unwrap_err();
        assert!(matches!(err, JobError::NoProjectSelected));

        f.controller.select_project("log-0").unwrap();
        let err = f.controller.analyze_code("bugs", None).await.unwrap_err();
        assert!(matches!(err, JobError::WrongProjectType { .. }));
        assert!(f.api.started().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remediation_then_reindex_appends_project() {
        let partial: JobStatus = serde_json::from_value(json!({
            "status": "completed_with_errors",
            "findings": { "collection_format_issue": "Old collection format, reindex required" }
        }))
        .unwrap();
        let f = fixture(
            vec![Step::Status(pending(50.0, "Analyzing")), Step::Status(partial)],
            &[code_project()],
            ClientConfig::default(),
        );
        f.controller.select_project("job-0").unwrap();

        let handle = f.controller.analyze_code("bugs", None).await.unwrap();
        let action = match handle.wait().await {
            Some(PollOutcome::NeedsRemediation { action, .. }) => action,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(action.collection_name, "billing_c");

        f.api.script(vec![Step::Status(completed(None))]);
        let handle = f.controller.reindex(action).await.unwrap();
        assert!(handle.wait().await.unwrap().is_success());

        let projects = f.controller.projects();
        assert_eq!(projects.len(), 2);
        // The original record is left as it was
        assert_eq!(projects[0].id, "job-0");
        assert_eq!(projects[0].collection_name, "billing_c");
        let rebuilt = &projects[1];
        assert_eq!(rebuilt.id, "job-2");
        assert_eq!(rebuilt.name, "billing (Reindexed)");
        assert_eq!(rebuilt.collection_name, "billing_c_rebuilt");
        assert_eq!(f.controller.current_project().unwrap().id, "job-2");
        assert_eq!(stored_projects(&f.store).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_analysis_can_be_checked_again() {
        let config = ClientConfig {
            background_max_attempts: 2,
            ..ClientConfig::default()
        };
        let f = fixture(
            vec![Step::Status(pending(10.0, "Analyzing"))],
            &[code_project()],
            config,
        );
        f.controller.select_project("job-0").unwrap();

        let handle = f.controller.analyze_code("quality", None).await.unwrap();
        assert_eq!(
            handle.wait().await,
            Some(PollOutcome::TimedOut { attempts: 2 })
        );
        assert_eq!(f.api.status_calls(), 2);
        assert!(f.controller.snapshot().suspended.is_some());

        f.api.script(vec![Step::Status(completed(None))]);
        let handle = f.controller.check_again().unwrap();
        assert_eq!(handle.job_id, "job-1");
        assert!(handle.wait().await.unwrap().is_success());
        assert_eq!(f.api.status_calls(), 3);

        assert!(matches!(
            f.controller.check_again().unwrap_err(),
            JobError::NotReady { .. }
        ));
    }

    /// Records whether the timed out session was already resumable when announced
    #[derive(Default)]
    struct TimeoutWatcher {
        controller: std::sync::OnceLock<std::sync::Weak<AppController>>,
        resumable: Mutex<Vec<bool>>,
    }

    impl PollEventSink for TimeoutWatcher {
        fn emit(&self, event: PollEvent) {
            if let PollEvent::TimedOut { .. } = event {
                let resumable = self
                    .controller
                    .get()
                    .and_then(|c| c.upgrade())
                    .map(|c| c.snapshot().suspended.is_some())
                    .unwrap_or(false);
                self.resumable.lock().unwrap().push(resumable);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_resumable_when_announced() {
        let api = Arc::new(ScriptedApi::new(vec![Step::Status(pending(10.0, "Analyzing"))]));
        let repo = ProjectRepository::new(Arc::new(MemoryStore::new()));
        repo.save(&[code_project()]);
        let watcher = Arc::new(TimeoutWatcher::default());
        let config = ClientConfig {
            background_max_attempts: 1,
            ..ClientConfig::default()
        };

        let controller = Arc::new(AppController::new(api, repo, watcher.clone(), config));
        let _ = watcher.controller.set(Arc::downgrade(&controller));
        controller.select_project("job-0").unwrap();

        let handle = controller.analyze_code("bugs", None).await.unwrap();
        assert_eq!(handle.wait().await, Some(PollOutcome::TimedOut { attempts: 1 }));

        assert_eq!(*watcher.resumable.lock().unwrap(), vec![true]);
        assert!(controller.check_again().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_analysis_cancels_previous_session() {
        let f = fixture(
            vec![Step::Status(pending(10.0, "Analyzing"))],
            &[code_project()],
            ClientConfig::default(),
        );
        f.controller.select_project("job-0").unwrap();

        let first = f.controller.analyze_code("bugs", None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        let second = f.controller.analyze_code("security", None).await.unwrap();

        assert_eq!(f.controller.sessions().active_count(), 1);
        assert_eq!(first.wait().await, None);
        assert!(!second.is_finished());

        assert!(f.controller.cancel_analysis());
        assert_eq!(f.controller.sessions().active_count(), 0);
    }

    #[tokio::test]
    async fn test_ask_follows_selection() {
        let f = fixture(Vec::new(), &[log_project()], ClientConfig::default());

        f.controller.ask("hello").await.unwrap();
        f.controller.select_project("log-0").unwrap();
        f.controller.ask("any 5xx?").await.unwrap();
        f.controller.clear_selection();

        let asked = f.api.asked();
        assert_eq!(asked[0].0, QaTarget::Code);
        assert_eq!(asked[0].1, "");
        assert_eq!(asked[1].0, QaTarget::Log);
        assert_eq!(asked[1].1, "nginx_l");
        assert!(f.controller.current_project().is_none());
    }

    #[tokio::test]
    async fn test_log_analysis_views() {
        let analyzed: JobStatus = serde_json::from_value(json!({
            "status": "completed",
            "analysis": { "summary": "2 crash loops", "errors": ["OOMKilled"] }
        }))
        .unwrap();
        let f = fixture(
            vec![
                Step::Status(pending(40.0, "Parsing")),
                Step::Status(analyzed.clone()),
                Step::Status(completed(None)),
                Step::Status(analyzed),
            ],
            &[log_project()],
            ClientConfig::default(),
        );
        f.controller.select_project("log-0").unwrap();

        let err = f.controller.log_analysis(None).await.unwrap_err();
        assert!(matches!(err, JobError::NotReady { .. }));

        match f.controller.log_analysis(None).await.unwrap() {
            LogReport::Analysis(analysis) => {
                assert_eq!(analysis.summary.as_deref(), Some("2 crash loops"))
            }
            other => panic!("unexpected report: {:?}", other),
        }

        assert_eq!(
            f.controller.log_analysis(None).await.unwrap(),
            LogReport::NoAnalysis
        );

        let report = f.controller.log_analysis(Some("what crashed?")).await.unwrap();
        assert!(matches!(report, LogReport::Answer(_)));
        assert_eq!(f.api.asked()[0].0, QaTarget::Log);
    }

    #[tokio::test]
    async fn test_select_unknown_project() {
        let f = fixture(Vec::new(), &[code_project()], ClientConfig::default());
        assert!(matches!(
            f.controller.select_project("nope").unwrap_err(),
            JobError::ProjectNotFound { .. }
        ));
        assert_eq!(f.controller.projects().len(), 1);
    }
}
