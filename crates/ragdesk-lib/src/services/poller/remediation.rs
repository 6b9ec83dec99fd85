// Remediation detection
// Recognises analysis findings that ask for the collection to be rebuilt

use crate::models::{JobState, JobStatus};

/// Finding key the backend uses for index format problems
pub const COLLECTION_FORMAT_ISSUE: &str = "collection_format_issue";

/// Whether a single finding asks for a reindex
pub fn finding_requests_reindex(key: &str, text: &str) -> bool {
    let text = text.to_lowercase();
    if !text.contains("reindex") {
        return false;
    }
    key == COLLECTION_FORMAT_ISSUE || text.contains("older format")
}

/// Whether any finding of the status asks for a reindex
pub fn findings_request_reindex(status: &JobStatus) -> bool {
    status
        .findings()
        .any(|(key, text)| finding_requests_reindex(key, text))
}

/// Early path, checked before terminal dispatch: partial success with a format finding
pub fn is_partial_success_needing_reindex(status: &JobStatus) -> bool {
    status.status == JobState::CompletedWithErrors && findings_request_reindex(status)
}

/// Action that rebuilds a collection in the current format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexAction {
    pub collection_name: String,
    pub project_name: String,
}
