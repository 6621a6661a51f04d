//! Error types for the Dartboard library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Dartboard operations.
#[derive(Debug, Error)]
pub enum DartboardError {
    /// User input is insufficient for the requested operation.
    ///
    /// The message is meant to be shown to the user as-is; nothing has been
    /// sent to the backend when this is returned.
    #[error("{0}")]
    Validation(String),

    /// The backend never reported a status for a submitted job.
    #[error("Job {job_id} not found after {attempts} attempts")]
    JobNotFound { job_id: i64, attempts: u32 },

    /// Expected attribute configuration or color information is missing.
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// A bounded status check ran out of attempts.
    #[error("Timed out waiting for {task} after {checks} checks")]
    Timeout { task: String, checks: u32 },

    /// A job monitor was cancelled before the job reached a terminal state.
    #[error("Monitoring cancelled")]
    Cancelled,

    /// Malformed input (form keys, colors, palette specs, predicates).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport or status error from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl DartboardError {
    /// Returns true if this error should block a submission with a
    /// user-visible message rather than be logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, DartboardError::Validation(_))
    }
}

/// Result type alias for Dartboard operations.
pub type Result<T> = std::result::Result<T, DartboardError>;
