//! Error taxonomy for the capture-compress-deliver pipeline.
//!
//! Propagation policy: inspection and save failures are fatal for the
//! invocation and are logged verbosely while the operator only sees a
//! short generic message; an upload failure is recoverable and triggers
//! the local-save fallback. Compression failures are plain [`std::io::Error`]s
//! and are fatal only for the compression sub-step. Nothing retries.

use std::path::PathBuf;

use thiserror::Error;

/// Heap inspection failed. Fatal: no compression or delivery is attempted
/// for the invocation.
#[derive(Debug, Error)]
#[error("heap inspection failed: {message}")]
pub struct InspectionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl InspectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Upload to the artifact endpoint failed. Recoverable: the delivery
/// strategy falls back to exactly one local save.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed upload response")]
    Response(#[source] reqwest::Error),
}

/// Writing the artifact to disk failed. Terminal: there is no further
/// fallback after a local save fails.
#[derive(Debug, Error)]
#[error("failed to save artifact to {}", .path.display())]
pub struct SaveError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
