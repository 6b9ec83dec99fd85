// Job Client Error Types
// Shared by the HTTP client, the pollers and the controller

use thiserror::Error;

use crate::utils::shared_store::sanitize_error;

/// Job Client Error
#[derive(Error, Debug)]
pub enum JobError {
    /// Backend unreachable or the request never completed
    #[error("Cannot connect to {endpoint}: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    /// Non-2xx response, carries the response body text
    #[error("Request to {endpoint} failed ({status}): {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Malformed response body
    #[error("Failed to parse response from {endpoint}: {message}")]
    ParseError { endpoint: String, message: String },

    /// Backend reported `status: failed`
    #[error("{label} failed: {message}")]
    JobFailed { label: String, message: String },

    /// Attempt budget exhausted
    #[error("{label} timed out after {attempts} status checks. Please check status later.")]
    JobTimedOut { label: String, attempts: u32 },

    /// Background session gave up after repeated status check failures
    #[error("Error checking {label} status after {errors} consecutive failures: {message}")]
    PollingAborted {
        label: String,
        errors: u32,
        message: String,
    },

    /// Invalid user input
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Unknown project id
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    /// Operation needs a selected project
    #[error("Please select a project first")]
    NoProjectSelected,

    /// Operation needs a project of another type
    #[error("Please select a {expected} project first")]
    WrongProjectType { expected: String },

    /// Another job is already being processed
    #[error("{operation} already in progress. Please wait for it to complete.")]
    Busy { operation: String },

    /// The job has not reached the state the operation needs
    #[error("{message}")]
    NotReady { message: String },

    /// IO error (reading upload files)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;

/// Job error codes for front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobErrorCode {
    ConnectionFailed,
    HttpStatus,
    ParseError,
    JobFailed,
    JobTimedOut,
    PollingAborted,
    InvalidInput,
    ProjectNotFound,
    NoProjectSelected,
    WrongProjectType,
    Busy,
    NotReady,
    IoError,
}

impl JobErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorCode::ConnectionFailed => "JOB_CONNECTION_FAILED",
            JobErrorCode::HttpStatus => "JOB_HTTP_ERROR",
            JobErrorCode::ParseError => "JOB_PARSE_ERROR",
            JobErrorCode::JobFailed => "JOB_FAILED",
            JobErrorCode::JobTimedOut => "JOB_TIMEOUT",
            JobErrorCode::PollingAborted => "JOB_POLLING_ABORTED",
            JobErrorCode::InvalidInput => "JOB_INVALID_INPUT",
            JobErrorCode::ProjectNotFound => "JOB_PROJECT_NOT_FOUND",
            JobErrorCode::NoProjectSelected => "JOB_NO_PROJECT",
            JobErrorCode::WrongProjectType => "JOB_WRONG_PROJECT_TYPE",
            JobErrorCode::Busy => "JOB_BUSY",
            JobErrorCode::NotReady => "JOB_NOT_READY",
            JobErrorCode::IoError => "JOB_IO_ERROR",
        }
    }
}

impl JobError {
    pub fn code(&self) -> JobErrorCode {
        match self {
            JobError::ConnectionFailed { .. } => JobErrorCode::ConnectionFailed,
            JobError::HttpStatus { .. } => JobErrorCode::HttpStatus,
            JobError::ParseError { .. } => JobErrorCode::ParseError,
            JobError::JobFailed { .. } => JobErrorCode::JobFailed,
            JobError::JobTimedOut { .. } => JobErrorCode::JobTimedOut,
            JobError::PollingAborted { .. } => JobErrorCode::PollingAborted,
            JobError::InvalidInput { .. } => JobErrorCode::InvalidInput,
            JobError::ProjectNotFound { .. } => JobErrorCode::ProjectNotFound,
            JobError::NoProjectSelected => JobErrorCode::NoProjectSelected,
            JobError::WrongProjectType { .. } => JobErrorCode::WrongProjectType,
            JobError::Busy { .. } => JobErrorCode::Busy,
            JobError::NotReady { .. } => JobErrorCode::NotReady,
            JobError::IoError(_) => JobErrorCode::IoError,
        }
    }

    /// HTTP status code, when the backend answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            JobError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Convert to a user-friendly error message for front ends
    pub fn to_user_message(&self) -> String {
        sanitize_error(&self.to_string())
    }
}

impl From<JobError> for String {
    fn from(err: JobError) -> Self {
        err.to_string()
    }
}
