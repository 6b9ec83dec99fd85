// Command line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Analysis requested when `--type` is omitted
pub const DEFAULT_ANALYSIS_TYPE: &str = "comprehensive";

#[derive(Debug, Parser)]
#[command(name = "ragdesk", version, about = "Index codebases and logs, then ask questions about them")]
pub struct Cli {
    /// Config file (defaults to ragdesk.toml in the app data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend API root, overrides the config file and RAGDESK_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List stored projects
    Projects,

    /// Index a new project
    Add(AddArgs),

    /// Ask a question, about a project or in free conversation
    Ask(AskArgs),

    /// Run a code analysis and follow it until it finishes
    Analyze(AnalyzeArgs),

    /// Rebuild a project's collection in the current index format
    Reindex(ProjectArgs),

    /// Show the automatic analysis of a log project, or ask about it
    Logs(LogsArgs),

    /// Interactive session
    Chat,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(subcommand)]
    pub source: AddSource,
}

#[derive(Debug, Subcommand)]
pub enum AddSource {
    /// Upload a zip archive
    Zip(FileSource),
    /// Upload a rar archive
    Rar(FileSource),
    /// Upload an archive, zip or rar picked from the file name
    Archive(FileSource),
    /// Import a public GitHub repository
    Github(GitHubSource),
    /// Upload a log file
    Log(FileSource),
}

#[derive(Debug, Args)]
pub struct FileSource {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Project name (defaults to the file name without extension)
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct GitHubSource {
    #[arg(value_name = "URL")]
    pub url: String,

    /// Project name (defaults to the repository name)
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Project id, omit for free conversation
    #[arg(short, long)]
    pub project: Option<String>,

    #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
    pub question: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Code project id
    #[arg(short, long)]
    pub project: String,

    /// Analysis type
    #[arg(short = 't', long = "type", default_value = DEFAULT_ANALYSIS_TYPE)]
    pub analysis_type: String,

    /// Restrict the analysis to one file
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Reindex automatically when the collection format is outdated
    #[arg(long)]
    pub reindex: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project id
    #[arg(short, long)]
    pub project: String,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Log project id
    #[arg(short, long)]
    pub project: String,

    /// Question about the logs
    #[arg(short, long)]
    pub query: Option<String>,
}
