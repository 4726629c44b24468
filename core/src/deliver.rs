//! Delivery strategy: hosted upload with local-save fallback.
//!
//! Upload is preferred unless the operator explicitly asked for a file.
//! An upload failure of any kind is recoverable: the operator is told a
//! local save will be attempted instead, and exactly one save follows. A
//! failed save is terminal for the invocation.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::error;

use crate::error::SaveError;
use crate::error::UploadError;
use crate::notify::NotificationSink;

/// Where a delivered artifact ended up. Exactly one variant is produced
/// per delivery attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Uploaded; holds the viewer URL built from the returned key.
    Uploaded(String),
    /// Written to the local filesystem.
    SavedLocally(PathBuf),
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    key: String,
}

/// Client for the paste-bin style artifact endpoint: POST a content blob
/// with a media-type tag, get back the retrieval key used to build viewer
/// URLs.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    post_url: String,
    viewer_base: String,
}

impl UploadClient {
    pub fn new(post_url: impl Into<String>, viewer_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            post_url: post_url.into(),
            viewer_base: viewer_base.into(),
        }
    }

    /// Base URL of the viewer web-app.
    pub fn viewer_base(&self) -> &str {
        &self.viewer_base
    }

    /// Viewer URL for an uploaded artifact key.
    pub fn viewer_url(&self, key: &str) -> String {
        format!("{}{key}", self.viewer_base)
    }

    /// POST the artifact bytes, returning the retrieval key. Any failure
    /// (connect, non-2xx status, undecodable body) is an [`UploadError`].
    pub async fn post_artifact(
        &self,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<String, UploadError> {
        let response = self
            .http
            .post(&self.post_url)
            .header(reqwest::header::CONTENT_TYPE, media_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }

        let body: PostResponse = response.json().await.map_err(UploadError::Response)?;
        Ok(body.key)
    }
}

/// Deliver a serialized artifact.
///
/// With `save_locally_requested` the upload path is skipped entirely (zero
/// network calls). Otherwise upload is attempted first; on failure the
/// operator is notified and the bytes fall through to exactly one local
/// save. The save itself may fail, which is terminal — there is no third
/// fallback.
pub async fn deliver(
    client: &UploadClient,
    sink: &dyn NotificationSink,
    bytes: &[u8],
    media_type: &str,
    save_path: &Path,
    save_locally_requested: bool,
) -> Result<DeliveryOutcome, SaveError> {
    if !save_locally_requested {
        match client.post_artifact(bytes.to_vec(), media_type).await {
            Ok(key) => return Ok(DeliveryOutcome::Uploaded(client.viewer_url(&key))),
            Err(err) => {
                error!("artifact upload failed: {err}");
                sink.broadcast(
                    "An error occurred whilst uploading the data. Attempting to save to disk instead."
                        .to_string(),
                );
            }
        }
    }

    match fs::write(save_path, bytes) {
        Ok(()) => Ok(DeliveryOutcome::SavedLocally(save_path.to_path_buf())),
        Err(source) => Err(SaveError {
            path: save_path.to_path_buf(),
            source,
        }),
    }
}
