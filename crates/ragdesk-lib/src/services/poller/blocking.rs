// Blocking poll
// Sequential status loop used while an ingest job runs

use tokio::time::sleep;

use super::events::{PollEvent, PollEventSink};
use super::policy::BlockingPolicy;
use crate::models::{JobKind, JobState, JobStatus};
use crate::services::backend::{JobApi, JobError, JobResult};

/// Poll a job until it reaches a terminal state.
///
/// The first check runs immediately and the policy interval separates later
/// checks. Any check failure aborts the poll. Returns the final status on
/// `completed` or `completed_with_errors`.
pub async fn poll_until_complete(
    api: &dyn JobApi,
    job_id: &str,
    kind: JobKind,
    policy: &BlockingPolicy,
    sink: &dyn PollEventSink,
) -> JobResult<JobStatus> {
    for attempt in 1..=policy.max_attempts {
        let status = api.get_status(job_id, kind).await?;

        match status.status {
            state if state.is_success() => {
                log::info!("{} job {} completed after {} checks", kind.label(), job_id, attempt);
                return Ok(status);
            }
            JobState::Failed => {
                let message = if status.message.is_empty() {
                    format!("{} failed", kind.label())
                } else {
                    status.message
                };
                return Err(JobError::JobFailed {
                    label: kind.label().to_string(),
                    message,
                });
            }
            _ => {
                let progress = status.progress();
                sink.emit(PollEvent::Progress {
                    job_id: job_id.to_string(),
                    kind,
                    attempt,
                    percentage: progress.percentage,
                    stage: progress.stage,
                    message: status.message,
                });
            }
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    log::warn!(
        "{} job {} still running after {} checks",
        kind.label(),
        job_id,
        policy.max_attempts
    );
    Err(JobError::JobTimedOut {
        label: kind.label().to_string(),
        attempts: policy.max_attempts,
    })
}
