//! Media scratch store
//!
//! Image and video posts reference a file held in a remote object store.
//! Before dispatch the file is fetched into a local scratch directory keyed
//! by file name; after the publish attempt (success or failure) it is
//! removed both locally and remotely. Both directions are idempotent: the
//! fetch skips files already on disk and the cleanup tolerates files that
//! are already gone.

use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

use crate::config::Config;

// ============================================================================
// Errors
// ============================================================================

/// Media store errors
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP client could not be constructed
    #[error("failed to initialize media HTTP client: {0}")]
    Init(#[source] reqwest::Error),

    /// Network-level failure talking to the object store
    #[error("media request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Object store answered with a non-success status
    #[error("media store rejected '{file_name}' (HTTP {status})")]
    Rejected { file_name: String, status: u16 },

    /// Local scratch file error
    #[error("scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Whether this error should stop the consumer entirely
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

// ============================================================================
// Media Store
// ============================================================================

/// Client for the remote object store plus its local scratch directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    http: Client,
    base_url: String,
    access_key: String,
    scratch_dir: PathBuf,
}

impl MediaStore {
    /// Create a store from runtime configuration
    pub fn new(config: &Config) -> MediaResult<Self> {
        Self::from_parts(
            &config.media_url,
            &config.media_access_key,
            config.scratch_dir.clone(),
            config.http_timeout(),
        )
    }

    /// Create a store from explicit parts
    pub fn from_parts(
        base_url: &str,
        access_key: &str,
        scratch_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MediaError::Init)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            scratch_dir: scratch_dir.into(),
        })
    }

    /// Override the base URL (used by tests against a local mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn local_path(&self, file_name: &str) -> PathBuf {
        self.scratch_dir.join(file_name)
    }

    fn remote_url(&self, file_name: &str) -> String {
        format!("{}/files/{}", self.base_url, file_name)
    }

    /// Fetch a file into the scratch directory.
    ///
    /// Skips the download when the file is already present; the scratch
    /// directory is created on demand.
    pub async fn fetch(&self, file_name: &str) -> MediaResult<PathBuf> {
        let path = self.local_path(file_name);

        if fs::try_exists(&path).await? {
            tracing::debug!(file = file_name, "media already in scratch, skipping fetch");
            return Ok(path);
        }

        fs::create_dir_all(&self.scratch_dir).await?;

        let response = self
            .http
            .get(self.remote_url(file_name))
            .bearer_auth(&self.access_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Rejected {
                file_name: file_name.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        fs::write(&path, &bytes).await?;

        tracing::debug!(file = file_name, bytes = bytes.len(), "fetched media into scratch");
        Ok(path)
    }

    /// Remove a file locally and from the remote store.
    ///
    /// A missing local file is skipped; a remote 404 or 409 counts as
    /// already deleted.
    pub async fn cleanup(&self, file_name: &str) -> MediaResult<()> {
        match fs::remove_file(self.local_path(file_name)).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let response = self
            .http
            .delete(self.remote_url(file_name))
            .bearer_auth(&self.access_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success()
            || status == StatusCode::NOT_FOUND
            || status == StatusCode::CONFLICT
        {
            tracing::debug!(file = file_name, "media cleaned up");
            Ok(())
        } else {
            Err(MediaError::Rejected {
                file_name: file_name.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(scratch: PathBuf) -> MediaStore {
        MediaStore::from_parts(
            "https://media.example.com/",
            "access-key",
            scratch,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_path_shaping() {
        let store = test_store(PathBuf::from("./multimedia"));

        assert_eq!(
            store.remote_url("clip.mp4"),
            "https://media.example.com/files/clip.mp4"
        );
        assert_eq!(
            store.local_path("clip.mp4"),
            PathBuf::from("./multimedia/clip.mp4")
        );
    }

    #[tokio::test]
    async fn test_fetch_skips_files_already_in_scratch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("photo.jpg"), b"bytes").await.unwrap();

        // Unroutable base URL: a network attempt would fail loudly
        let store = test_store(dir.path().to_path_buf()).with_base_url("http://127.0.0.1:1");

        let path = store.fetch("photo.jpg").await.unwrap();
        assert_eq!(path, dir.path().join("photo.jpg"));
    }
}
