// ragdesk - shared library
// Job client, pollers, conversation dispatcher, project store and controller

pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

// Re-export models for use by front ends
pub use models::*;

pub use config::ClientConfig;
pub use repositories::{ProjectRepository, SettingsRepository};
pub use services::backend::{
    create_client, github_repo_name, HttpJobClient, IngestSource, JobApi, JobError, JobErrorCode,
    JobResult, QaTarget,
};
pub use services::controller::{AppController, AppState, LogReport};
pub use services::poller::{
    ChannelSink, NullSink, PollEvent, PollEventSink, PollOutcome, ReindexAction, SessionHandle,
};
