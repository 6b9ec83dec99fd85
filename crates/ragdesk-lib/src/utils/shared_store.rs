// Shared Store Module
//
// This module provides:
// 1. App identifier and path utilities
// 2. Input validation (project names, questions, GitHub URLs)
// 3. Error sanitization

use std::path::PathBuf;

// ============================================================================
// App Constants
// ============================================================================

/// App identifier, names the data directory
pub const APP_IDENTIFIER: &str = "com.ragdesk.RagDesk";

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|p| p.join(APP_IDENTIFIER))
        .ok_or_else(|| "Could not determine application data directory".to_string())
}

// ============================================================================
// Error Sanitization
// ============================================================================

/// Sanitize error messages to prevent information leakage
///
/// Replaces home directory paths with `~`.
pub fn sanitize_error(error: &str) -> String {
    let home_dir = dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut sanitized = error.to_string();

    if !home_dir.is_empty() && home_dir != "/" {
        sanitized = sanitized.replace(&home_dir, "~");
    }

    sanitized
        .replace("/Users/", "~/")
        .replace("/home/", "~/")
}

// ============================================================================
// Input Validation
// ============================================================================

pub const MAX_NAME_LENGTH: usize = 256;
pub const MAX_QUESTION_LENGTH: usize = 8192;
pub const MAX_URL_LENGTH: usize = 2048;

/// Validate string length and non-emptiness
pub fn validate_string_length(field_name: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.len() > max_len {
        return Err(format!(
            "{} exceeds maximum length ({} > {})",
            field_name,
            value.len(),
            max_len
        ));
    }
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }
    Ok(())
}

pub fn validate_project_name(name: &str) -> Result<(), String> {
    validate_string_length("Project name", name, MAX_NAME_LENGTH)
}

pub fn validate_question(question: &str) -> Result<(), String> {
    validate_string_length("Question", question, MAX_QUESTION_LENGTH)
}

/// GitHub import only accepts http(s) URLs
pub fn validate_repo_url(repo_url: &str) -> Result<(), String> {
    validate_string_length("Repository URL", repo_url, MAX_URL_LENGTH)?;
    let parsed =
        url::Url::parse(repo_url.trim()).map_err(|e| format!("Invalid repository URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("Unsupported repository URL scheme: {}", scheme)),
    }
}
