// Job Poller Module
//
// This module provides:
// - Blocking poll for ingest jobs (fixed delay, abort on first failed check)
// - Resilient poll for analysis and reindex jobs (timer driven, error tolerant)
// - Remediation detection for analyses run against outdated collections
// - Session registry keeping one session per slot
// - Presentation events and sinks

pub mod blocking;
pub mod events;
pub mod policy;
pub mod registry;
pub mod remediation;
pub mod resilient;

#[cfg(test)]
pub(crate) mod testing;

pub use blocking::poll_until_complete;
pub use events::{ChannelSink, NullSink, PollEvent, PollEventSink};
pub use policy::{BlockingPolicy, ResilientPolicy};
pub use registry::{PollSlot, SessionHandle, SessionRegistry};
pub use remediation::{findings_request_reindex, is_partial_success_needing_reindex, ReindexAction};
pub use resilient::{run_resilient, PollOutcome, PollTarget};
