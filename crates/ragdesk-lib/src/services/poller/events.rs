// Poll events
// Presentation sink seam: pollers and the controller push events, front ends render them

use std::collections::BTreeMap;
use tokio::sync::mpsc;

use super::remediation::ReindexAction;
use crate::models::{JobKind, JobStatus, Project};

/// Event pushed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Non-terminal tick
    Progress {
        job_id: String,
        kind: JobKind,
        attempt: u32,
        percentage: f64,
        stage: String,
        message: String,
    },
    Completed {
        job_id: String,
        kind: JobKind,
        status: JobStatus,
    },
    RemediationRequired {
        job_id: String,
        action: ReindexAction,
        findings: BTreeMap<String, String>,
    },
    Failed {
        job_id: String,
        kind: JobKind,
        message: String,
    },
    /// Background session gave up after repeated check failures
    Fatal {
        job_id: String,
        kind: JobKind,
        message: String,
    },
    /// Soft timeout, the session can be resumed
    TimedOut {
        job_id: String,
        kind: JobKind,
        attempts: u32,
    },
    /// Status endpoint no longer knows the job
    StatusUnavailable { job_id: String, kind: JobKind },
    ProjectAdded { project: Project },
}

/// Receiver of poll events
pub trait PollEventSink: Send + Sync {
    fn emit(&self, event: PollEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PollEventSink for NullSink {
    fn emit(&self, _event: PollEvent) {}
}

/// Sink forwarding events to a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PollEventSink for ChannelSink {
    fn emit(&self, event: PollEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Poll event receiver dropped");
        }
    }
}
