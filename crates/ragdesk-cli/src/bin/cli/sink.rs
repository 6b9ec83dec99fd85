// Terminal presentation sink
// Renders poll events on stderr so command output on stdout stays clean

use ragdesk_lib::{JobKind, JobStatus, PollEvent, PollEventSink};

pub struct TerminalSink {
    verbose: bool,
}

impl TerminalSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl PollEventSink for TerminalSink {
    fn emit(&self, event: PollEvent) {
        match event {
            PollEvent::Progress {
                kind,
                attempt,
                percentage,
                stage,
                message,
                ..
            } => {
                if self.verbose && !message.is_empty() {
                    eprintln!("  {} {:>3.0}%  {} ({}, check {})", kind.label(), percentage, stage, message, attempt);
                } else {
                    eprintln!("  {} {:>3.0}%  {}", kind.label(), percentage, stage);
                }
            }
            PollEvent::Completed { kind, status, .. } => {
                eprintln!("{} completed.", kind.label());
                if kind == JobKind::Analyze {
                    print_analysis(&status);
                }
            }
            PollEvent::RemediationRequired {
                action, findings, ..
            } => {
                eprintln!(
                    "Collection '{}' uses an outdated index format and must be reindexed.",
                    action.collection_name
                );
                for (issue, text) in &findings {
                    println!("{}:\n{}\n", issue, text);
                }
            }
            PollEvent::Failed { kind, message, .. } => {
                eprintln!("{} failed: {}", kind.label(), message);
            }
            PollEvent::Fatal { kind, message, .. } => {
                eprintln!("Error checking {} status: {}", kind.label().to_lowercase(), message);
            }
            PollEvent::TimedOut { kind, attempts, .. } => {
                eprintln!(
                    "{} is taking longer than expected ({} checks). It may still be running.",
                    kind.label(),
                    attempts
                );
            }
            PollEvent::StatusUnavailable { kind, .. } => {
                eprintln!(
                    "{} status is no longer available. The job may have finished; look for a project whose collection ends in '_rebuilt'.",
                    kind.label()
                );
            }
            PollEvent::ProjectAdded { project } => {
                eprintln!(
                    "Added {} project '{}' ({})",
                    project.project_type, project.name, project.id
                );
            }
        }
    }
}

/// Print analysis findings and the issues met while analysing
pub fn print_analysis(status: &JobStatus) {
    let mut any = false;
    for (issue, text) in status.findings() {
        println!("== {} ==\n{}\n", issue, text);
        any = true;
    }
    if !any {
        println!("No findings reported.");
    }

    let errors = status.detail_errors();
    if !errors.is_empty() {
        println!("Issues during analysis:");
        for error in errors {
            println!("  - {}", error);
        }
    }
}
