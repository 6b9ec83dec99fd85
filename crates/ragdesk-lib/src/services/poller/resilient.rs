// Resilient poll
// Timer driven status loop for analysis and reindex jobs. Tolerates transient
// check failures and ends in a soft timeout that the user can resume.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};

use super::events::{PollEvent, PollEventSink};
use super::policy::ResilientPolicy;
use super::remediation::{findings_request_reindex, is_partial_success_needing_reindex, ReindexAction};
use crate::models::{JobKind, JobState, JobStatus};
use crate::services::backend::JobApi;

/// Job followed by a resilient session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub job_id: String,
    pub kind: JobKind,
    /// Collection the job runs against
    pub collection_name: String,
    /// Display name of the project owning the collection
    pub project_name: String,
}

/// Terminal outcome of a poll session
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Succeeded(JobStatus),
    /// Partial success, the collection has to be rebuilt
    NeedsRemediation {
        action: ReindexAction,
        status: JobStatus,
    },
    Failed { message: String },
    /// Gave up after consecutive check failures
    Aborted {
        consecutive_errors: u32,
        error: String,
    },
    /// Attempt budget exhausted, resumable
    TimedOut { attempts: u32 },
    /// Status endpoint returned 404 for a reindex job
    StatusUnavailable,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded(_))
    }
}

/// Poll until the job reaches a terminal state or the session gives up.
///
/// The first check runs immediately. Checks are awaited inside the loop, so a
/// slow response delays the next tick instead of overlapping it.
///
/// A timeout is returned without an event. The owner of the session records
/// it as resumable and then announces `PollEvent::TimedOut`.
pub async fn run_resilient(
    api: Arc<dyn JobApi>,
    target: PollTarget,
    policy: ResilientPolicy,
    sink: Arc<dyn PollEventSink>,
) -> PollOutcome {
    let PollTarget { job_id, kind, .. } = target.clone();
    let mut ticker = interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u32 = 0;
    let mut consecutive_errors: u32 = 0;

    loop {
        ticker.tick().await;
        attempts += 1;

        match api.get_status(&job_id, kind).await {
            Err(e) if policy.not_found_is_terminal && e.is_not_found() => {
                log::warn!("{} job {} status unavailable", kind.label(), job_id);
                sink.emit(PollEvent::StatusUnavailable {
                    job_id: job_id.clone(),
                    kind,
                });
                return PollOutcome::StatusUnavailable;
            }
            Err(e) => {
                consecutive_errors += 1;
                log::warn!(
                    "{} status check {} for {} failed ({}/{}): {}",
                    kind.label(),
                    attempts,
                    job_id,
                    consecutive_errors,
                    policy.max_consecutive_errors,
                    e
                );

                if consecutive_errors >= policy.max_consecutive_errors {
                    let error = e.to_string();
                    sink.emit(PollEvent::Fatal {
                        job_id: job_id.clone(),
                        kind,
                        message: error.clone(),
                    });
                    return PollOutcome::Aborted {
                        consecutive_errors,
                        error,
                    };
                }
            }
            Ok(status) => {
                consecutive_errors = 0;

                if kind == JobKind::Analyze && is_partial_success_needing_reindex(&status) {
                    return needs_remediation(&target, status, sink.as_ref());
                }

                match status.status {
                    state if state.is_success() => {
                        if kind == JobKind::Analyze && findings_request_reindex(&status) {
                            return needs_remediation(&target, status, sink.as_ref());
                        }
                        log::info!("{} job {} completed", kind.label(), job_id);
                        sink.emit(PollEvent::Completed {
                            job_id: job_id.clone(),
                            kind,
                            status: status.clone(),
                        });
                        return PollOutcome::Succeeded(status);
                    }
                    JobState::Failed => {
                        let message = if status.message.is_empty() {
                            "Unknown error".to_string()
                        } else {
                            status.message
                        };
                        sink.emit(PollEvent::Failed {
                            job_id: job_id.clone(),
                            kind,
                            message: message.clone(),
                        });
                        return PollOutcome::Failed { message };
                    }
                    _ => {
                        let progress = status.progress();
                        sink.emit(PollEvent::Progress {
                            job_id: job_id.clone(),
                            kind,
                            attempt: attempts,
                            percentage: progress.percentage,
                            stage: progress.stage,
                            message: status.message,
                        });
                    }
                }
            }
        }

        if attempts >= policy.max_attempts {
            log::warn!("{} job {} timed out after {} checks", kind.label(), job_id, attempts);
            return PollOutcome::TimedOut { attempts };
        }
    }
}

fn needs_remediation(target: &PollTarget, status: JobStatus, sink: &dyn PollEventSink) -> PollOutcome {
    log::info!(
        "Analysis of {} reports an outdated collection format",
        target.collection_name
    );
    let action = ReindexAction {
        collection_name: target.collection_name.clone(),
        project_name: target.project_name.clone(),
    };
    let findings: BTreeMap<String, String> = status.findings.clone().unwrap_or_default();
    sink.emit(PollEvent::RemediationRequired {
        job_id: target.job_id.clone(),
        action: action.clone(),
        findings,
    });
    PollOutcome::NeedsRemediation { action, status }
}
