// Poll policies
// Interval and budget parameters for the two polling flavors

use std::time::Duration;

use crate::models::JobKind;

/// Ingest: fixed delay between checks
pub const INGEST_POLL_INTERVAL_MS: u64 = 2_000;

/// Ingest: maximum status checks (2 minutes)
pub const INGEST_MAX_ATTEMPTS: u32 = 60;

/// Analysis and reindex: timer period
pub const BACKGROUND_POLL_INTERVAL_MS: u64 = 10_000;

/// Analysis and reindex: maximum status checks (10 minutes)
pub const BACKGROUND_MAX_ATTEMPTS: u32 = 60;

/// Consecutive failed checks before a background session gives up
pub const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Parameters of the blocking (ingest) poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for BlockingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(INGEST_POLL_INTERVAL_MS),
            max_attempts: INGEST_MAX_ATTEMPTS,
        }
    }
}

/// Parameters of the resilient (background) poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResilientPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    /// A 404 on the status endpoint ends the session as StatusUnavailable
    pub not_found_is_terminal: bool,
}

impl ResilientPolicy {
    /// Default policy for a job kind
    pub fn for_kind(kind: JobKind) -> Self {
        Self {
            not_found_is_terminal: kind == JobKind::Reindex,
            ..Self::default()
        }
    }
}

impl Default for ResilientPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(BACKGROUND_POLL_INTERVAL_MS),
            max_attempts: BACKGROUND_MAX_ATTEMPTS,
            max_consecutive_errors: MAX_CONSECUTIVE_ERRORS,
            not_found_is_terminal: false,
        }
    }
}
