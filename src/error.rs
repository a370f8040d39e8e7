use thiserror::Error;

use crate::types::JobStatus;

/// Central error type for the phantom-trax crate.
#[derive(Debug, Error)]
pub enum RemixError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("REPLICATE_API_TOKEN is not set; generation is disabled")]
    MissingCredential,

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Audio analysis failed: {0}")]
    Analysis(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Remix job {id} {status}: {message}")]
    JobFailed {
        id: String,
        status: JobStatus,
        message: String,
    },

    #[error("Polling stopped for job {0}")]
    PollingStopped(String),

    #[error("Staging dir not available")]
    StagingDirUnavailable,
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for RemixError {
    fn from(e: std::io::Error) -> Self {
        RemixError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for RemixError {
    fn from(e: serde_json::Error) -> Self {
        RemixError::Anyhow(e.into())
    }
}

impl From<reqwest::Error> for RemixError {
    fn from(e: reqwest::Error) -> Self {
        RemixError::Anyhow(e.into())
    }
}

pub type Result<T> = std::result::Result<T, RemixError>;
