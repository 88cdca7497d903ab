//! Error types for erp-browser.

use std::path::PathBuf;

/// Browser errors.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Session state unreadable: {path}: {reason}")]
    SessionState { path: PathBuf, reason: String },

    #[error("Network interception failed: {0}")]
    NetworkError(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}
