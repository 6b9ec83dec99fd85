// Poll Session Registry
// Keeps at most one running session per logical slot. Starting a session in
// an occupied slot aborts the previous one first.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

use super::resilient::PollOutcome;
use crate::models::JobKind;

/// Logical slot a session occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollSlot {
    AnalysisStatus,
    ReindexStatus,
}

impl PollSlot {
    pub fn for_kind(kind: JobKind) -> Self {
        match kind {
            JobKind::Reindex => PollSlot::ReindexStatus,
            _ => PollSlot::AnalysisStatus,
        }
    }
}

struct ActiveSession {
    id: String,
    job_id: String,
    kind: JobKind,
    abort: AbortHandle,
}

/// Handle to a running session
#[derive(Debug)]
pub struct SessionHandle {
    pub id: String,
    pub slot: PollSlot,
    pub job_id: String,
    pub kind: JobKind,
    task: JoinHandle<PollOutcome>,
}

impl SessionHandle {
    /// Wait for the session to end. `None` when it was cancelled.
    pub async fn wait(self) -> Option<PollOutcome> {
        self.task.await.ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Session registry
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<PollSlot, ActiveSession>>>,
}

fn lock(sessions: &Mutex<HashMap<PollSlot, ActiveSession>>) -> MutexGuard<'_, HashMap<PollSlot, ActiveSession>> {
    match sessions.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `session` in `slot`, cancelling whatever ran there before
    pub fn start<F>(&self, slot: PollSlot, job_id: &str, kind: JobKind, session: F) -> SessionHandle
    where
        F: Future<Output = PollOutcome> + Send + 'static,
    {
        let id = format!(
            "ps_{}",
            Uuid::new_v4().to_string().split('-').next().unwrap_or("unknown")
        );

        // Held across spawn so the task cannot deregister before it is registered
        let mut sessions = lock(&self.sessions);

        if let Some(previous) = sessions.remove(&slot) {
            previous.abort.abort();
            log::info!(
                "Cancelled poll session {} ({} job {})",
                previous.id,
                previous.kind,
                previous.job_id
            );
        }

        let registry = Arc::clone(&self.sessions);
        let session_id = id.clone();
        let task = tokio::spawn(async move {
            let outcome = session.await;
            let mut sessions = lock(&registry);
            if sessions.get(&slot).map(|s| s.id == session_id).unwrap_or(false) {
                sessions.remove(&slot);
            }
            outcome
        });

        sessions.insert(
            slot,
            ActiveSession {
                id: id.clone(),
                job_id: job_id.to_string(),
                kind,
                abort: task.abort_handle(),
            },
        );
        log::debug!("Started poll session {} for {} job {}", id, kind, job_id);

        SessionHandle {
            id,
            slot,
            job_id: job_id.to_string(),
            kind,
            task,
        }
    }

    /// Cancel the session behind a handle if it is still the active one
    pub fn cancel(&self, handle: &SessionHandle) -> bool {
        let mut sessions = lock(&self.sessions);
        let is_current = sessions
            .get(&handle.slot)
            .map(|s| s.id == handle.id)
            .unwrap_or(false);
        if !is_current {
            return false;
        }
        if let Some(session) = sessions.remove(&handle.slot) {
            session.abort.abort();
        }
        true
    }

    pub fn cancel_slot(&self, slot: PollSlot) -> bool {
        match lock(&self.sessions).remove(&slot) {
            Some(session) => {
                session.abort.abort();
                log::info!("Cancelled poll session {}", session.id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, session) in lock(&self.sessions).drain() {
            session.abort.abort();
        }
    }

    pub fn is_active(&self, slot: PollSlot) -> bool {
        lock(&self.sessions).contains_key(&slot)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Job followed in a slot
    pub fn active_job(&self, slot: PollSlot) -> Option<(String, JobKind)> {
        lock(&self.sessions)
            .get(&slot)
            .map(|s| (s.job_id.clone(), s.kind))
    }
}
