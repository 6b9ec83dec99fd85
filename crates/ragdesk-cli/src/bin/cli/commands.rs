// Command handlers

use anyhow::{anyhow, bail, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

use ragdesk_lib::services::backend::ArchiveFormat;
use ragdesk_lib::{
    github_repo_name, AppController, ChatReply, IngestSource, JobError, JobKind, LogAnalysis,
    LogReport, PollOutcome, Project, ReindexAction, SessionHandle,
};

use super::args::{AddSource, AnalyzeArgs, AskArgs, FileSource, GitHubSource, LogsArgs, ProjectArgs};

/// Line reader over stdin shared by prompts and the chat loop
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    pub async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.read_line(&format!("{} [y/N] ", question)).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y") | Some("Y") | Some("yes")
        ))
    }
}

// ============================================================================
// Projects
// ============================================================================

pub fn list_projects(controller: &AppController) {
    let projects = controller.projects();
    if projects.is_empty() {
        println!("No projects yet. Add one with `ragdesk add`.");
        return;
    }

    let current = controller.current_project().map(|p| p.id);
    println!("{:<2}{:<38} {:<5} {:<28} {}", "", "ID", "TYPE", "NAME", "COLLECTION");
    for project in projects {
        let marker = if current.as_deref() == Some(project.id.as_str()) { "*" } else { "" };
        println!(
            "{:<2}{:<38} {:<5} {:<28} {}",
            marker, project.id, project.project_type, project.name, project.collection_name
        );
    }
}

fn default_file_name(file: &Path) -> Result<String> {
    file.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Cannot derive a project name from {}", file.display()))
}

fn file_source(source: FileSource, expected: Option<ArchiveFormat>) -> Result<(std::path::PathBuf, String)> {
    if !source.file.is_file() {
        bail!("File not found: {}", source.file.display());
    }
    if let Some(expected) = expected {
        if ArchiveFormat::from_path(&source.file) != expected {
            bail!("Expected a .{} file: {}", expected.as_str(), source.file.display());
        }
    }
    let name = match source.name {
        Some(name) => name,
        None => default_file_name(&source.file)?,
    };
    Ok((source.file, name))
}

fn github_source(source: GitHubSource) -> Result<IngestSource> {
    let name = match source.name {
        Some(name) => name,
        None => github_repo_name(&source.url)
            .ok_or_else(|| anyhow!("Cannot derive a project name from {}", source.url))?,
    };
    Ok(IngestSource::GitHub {
        url: source.url,
        name,
    })
}

/// Turn the `add` arguments into an ingest source
pub fn ingest_source(source: AddSource) -> Result<IngestSource> {
    Ok(match source {
        AddSource::Zip(file) => {
            let (path, name) = file_source(file, Some(ArchiveFormat::Zip))?;
            IngestSource::Archive { path, name }
        }
        AddSource::Rar(file) => {
            let (path, name) = file_source(file, Some(ArchiveFormat::Rar))?;
            IngestSource::Archive { path, name }
        }
        AddSource::Archive(file) => {
            let (path, name) = file_source(file, None)?;
            IngestSource::Archive { path, name }
        }
        AddSource::Github(source) => github_source(source)?,
        AddSource::Log(file) => {
            let (path, name) = file_source(file, None)?;
            IngestSource::LogFile { path, name }
        }
    })
}

pub async fn add_project(controller: &AppController, source: AddSource) -> Result<()> {
    let source = ingest_source(source)?;
    eprintln!("Processing '{}'...", source.name());
    let project = controller.add_project(source).await?;
    println!("{}", project.id);
    Ok(())
}

// ============================================================================
// Conversation
// ============================================================================

fn print_reply(reply: &ChatReply) {
    println!("{}", reply.answer);
    if !reply.sources.is_empty() {
        println!("\nSources:");
        for source in &reply.sources {
            println!("  - {}", source);
        }
    }
}

pub async fn ask(controller: &AppController, args: AskArgs) -> Result<()> {
    match &args.project {
        Some(id) => {
            controller.select_project(id)?;
        }
        None => controller.clear_selection(),
    }
    let reply = controller.ask(&args.question.join(" ")).await?;
    print_reply(&reply);
    Ok(())
}

// ============================================================================
// Analysis and reindex
// ============================================================================

/// Wait for a session, cancelling every session on Ctrl-C
async fn wait(controller: &AppController, handle: SessionHandle) -> Option<PollOutcome> {
    tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.shutdown();
            None
        }
    }
}

/// Follow a background session to its end.
/// Returns the reindex action when remediation is needed and was not run.
pub async fn follow(
    controller: &AppController,
    handle: SessionHandle,
    auto_reindex: bool,
    mut console: Option<&mut Console>,
) -> Result<Option<ReindexAction>> {
    let mut handle = handle;
    loop {
        let kind = handle.kind;
        match wait(controller, handle).await {
            None => bail!("Cancelled"),
            Some(PollOutcome::Succeeded(_)) | Some(PollOutcome::StatusUnavailable) => return Ok(None),
            Some(PollOutcome::NeedsRemediation { action, .. }) => {
                if !auto_reindex {
                    return Ok(Some(action));
                }
                eprintln!("Reindexing '{}'...", action.collection_name);
                handle = controller.reindex(action).await?;
            }
            Some(PollOutcome::TimedOut { .. }) => {
                let again = match console.as_deref_mut() {
                    Some(console) => console.confirm("Check again?").await?,
                    None => false,
                };
                if !again {
                    eprintln!("The job is still running on the server; check again later.");
                    return Ok(None);
                }
                handle = controller.check_again()?;
            }
            Some(PollOutcome::Failed { message }) => bail!(message),
            Some(PollOutcome::Aborted {
                consecutive_errors,
                error,
            }) => return Err(aborted(kind, consecutive_errors, error).into()),
        }
    }
}

fn aborted(kind: JobKind, consecutive_errors: u32, error: String) -> JobError {
    JobError::PollingAborted {
        label: kind.label().to_lowercase(),
        errors: consecutive_errors,
        message: error,
    }
}

fn reindex_hint(project: &Project) {
    eprintln!(
        "Run `ragdesk reindex --project {}` or repeat the analysis with --reindex.",
        project.id
    );
}

pub async fn analyze(controller: &AppController, args: AnalyzeArgs) -> Result<()> {
    let project = controller.select_project(&args.project)?;
    let handle = controller
        .analyze_code(&args.analysis_type, args.path.as_deref())
        .await?;
    eprintln!("Analyzing '{}' ({})...", project.name, args.analysis_type);

    let mut console = Console::new();
    let interactive = std::io::IsTerminal::is_terminal(&std::io::stdin());
    let console = if interactive { Some(&mut console) } else { None };

    if follow(controller, handle, args.reindex, console).await?.is_some() {
        reindex_hint(&project);
    }
    Ok(())
}

pub async fn reindex(controller: &AppController, args: ProjectArgs) -> Result<()> {
    let project = controller.select_project(&args.project)?;
    if !project.is_code() {
        bail!("Only code projects can be reindexed");
    }
    let handle = controller
        .reindex(ReindexAction {
            collection_name: project.collection_name.clone(),
            project_name: project.name.clone(),
        })
        .await?;
    eprintln!("Reindexing '{}'...", project.collection_name);

    follow(controller, handle, false, None).await?;
    Ok(())
}

// ============================================================================
// Logs
// ============================================================================

fn print_log_analysis(analysis: &LogAnalysis) {
    if let Some(summary) = &analysis.summary {
        println!("Summary\n{}\n", summary);
    }
    if !analysis.errors.is_empty() {
        println!("Errors");
        for error in &analysis.errors {
            println!("  - {}", error);
        }
        println!();
    }
    if let Some(patterns) = &analysis.patterns {
        println!("Patterns\n{}\n", patterns);
    }
    if let Some(recommendations) = &analysis.recommendations {
        println!("Recommendations\n{}", recommendations);
    }
}

fn print_log_report(report: &LogReport) {
    match report {
        LogReport::Analysis(analysis) => print_log_analysis(analysis),
        LogReport::NoAnalysis => println!("No analysis data available for this log file."),
        LogReport::Answer(reply) => print_reply(reply),
    }
}

pub async fn logs(controller: &AppController, args: LogsArgs) -> Result<()> {
    controller.select_project(&args.project)?;
    let report = controller.log_analysis(args.query.as_deref()).await?;
    print_log_report(&report);
    Ok(())
}

// ============================================================================
// Chat
// ============================================================================

const CHAT_HELP: &str = "\
Commands:
  /use <id>          select a project
  /none              free conversation
  /projects          list projects
  /analyze [type]    analyze the selected code project
  /reindex           rebuild the collection flagged by the last analysis
  /logs [question]   log analysis of the selected log project
  /quit              leave
Anything else is sent as a question.";

pub async fn chat(controller: &AppController) -> Result<()> {
    let mut console = Console::new();
    let mut pending_reindex: Option<ReindexAction> = None;
    println!("{}\n", CHAT_HELP);

    loop {
        let prompt = match controller.current_project() {
            Some(project) => format!("[{}]> ", project.name),
            None => "> ".to_string(),
        };
        let Some(line) = console.read_line(&prompt).await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let result: Result<()> = match command {
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{}", CHAT_HELP);
                Ok(())
            }
            "/projects" => {
                list_projects(controller);
                Ok(())
            }
            "/none" => {
                controller.clear_selection();
                Ok(())
            }
            "/use" => controller
                .select_project(rest)
                .map(|p| println!("Using '{}'", p.name))
                .map_err(Into::into),
            "/analyze" => {
                let analysis_type = if rest.is_empty() {
                    super::args::DEFAULT_ANALYSIS_TYPE
                } else {
                    rest
                };
                match controller.analyze_code(analysis_type, None).await {
                    Ok(handle) => follow(controller, handle, false, Some(&mut console))
                        .await
                        .map(|action| {
                            if action.is_some() {
                                eprintln!("Type /reindex to rebuild the collection.");
                            }
                            pending_reindex = action;
                        }),
                    Err(e) => Err(e.into()),
                }
            }
            "/reindex" => match pending_reindex.take() {
                Some(action) => match controller.reindex(action).await {
                    Ok(handle) => follow(controller, handle, false, None).await.map(|_| ()),
                    Err(e) => Err(e.into()),
                },
                None => Err(anyhow!("Nothing to reindex; run /analyze first")),
            },
            "/logs" => {
                let query = if rest.is_empty() { None } else { Some(rest) };
                controller
                    .log_analysis(query)
                    .await
                    .map(|report| print_log_report(&report))
                    .map_err(Into::into)
            }
            _ if command.starts_with('/') => Err(anyhow!("Unknown command {}; try /help", command)),
            _ => controller
                .ask(line)
                .await
                .map(|reply| print_reply(&reply))
                .map_err(Into::into),
        };

        if let Err(e) = result {
            eprintln!("Error: {:#}", e);
        }
    }

    controller.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: std::path::PathBuf, name: Option<&str>) -> FileSource {
        FileSource {
            file: path,
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_archive_name_defaults_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing-service.zip");
        std::fs::write(&path, b"PK").unwrap();

        let source = ingest_source(AddSource::Zip(file(path.clone(), None))).unwrap();
        assert_eq!(
            source,
            IngestSource::Archive {
                path,
                name: "billing-service".to_string()
            }
        );
    }

    #[test]
    fn test_zip_command_rejects_other_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src.rar");
        std::fs::write(&path, b"Rar!").unwrap();

        assert!(ingest_source(AddSource::Zip(file(path.clone(), None))).is_err());
        assert!(ingest_source(AddSource::Rar(file(path, Some("src")))).is_ok());
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = ingest_source(AddSource::Log(file("/nonexistent/app.log".into(), None)))
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_aborted_session_reports_polling_error() {
        let err = aborted(JobKind::Analyze, 3, "Connection refused".to_string());
        assert_eq!(err.code(), ragdesk_lib::JobErrorCode::PollingAborted);
        assert_eq!(
            err.to_string(),
            "Error checking analysis status after 3 consecutive failures: Connection refused"
        );
    }

    #[test]
    fn test_github_name_from_url() {
        let source = ingest_source(AddSource::Github(GitHubSource {
            url: "https://github.com/acme/payments.git".to_string(),
            name: None,
        }))
        .unwrap();
        assert_eq!(source.name(), "payments");
    }
}
