//! Idempotent artifact storage.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::{FetchError, FileWrite, HttpClient};
use crate::resolver::ArtifactLink;

/// Result of [`ArtifactStore::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The artifact was downloaded and written.
    Stored(PathBuf),
    /// A file with the derived name already existed; nothing was fetched.
    AlreadyPresent(PathBuf),
}

impl StoreOutcome {
    /// Path of the artifact on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Stored(path) | Self::AlreadyPresent(path) => path,
        }
    }
}

/// Writes artifacts into a download directory, at most once per derived name.
///
/// Existing files are never overwritten or re-validated. Two workers resolving
/// to the same link may both download it; the first complete download is kept
/// and the other reports [`StoreOutcome::AlreadyPresent`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    client: HttpClient,
    directory: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `directory`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the directory cannot be created.
    pub fn new(client: HttpClient, directory: &Path) -> Result<Self, FetchError> {
        std::fs::create_dir_all(directory).map_err(|e| FetchError::io(directory, e))?;
        Ok(Self {
            client,
            directory: directory.to_path_buf(),
        })
    }

    /// Download directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path an artifact is (or would be) stored at.
    #[must_use]
    pub fn path_for(&self, link: &ArtifactLink) -> PathBuf {
        self.directory.join(&link.name)
    }

    /// Makes sure the artifact behind `link` exists on disk.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the download fails or cannot be written.
    #[instrument(skip(self, link), fields(url = %link.url, name = %link.name))]
    pub async fn ensure(&self, link: &ArtifactLink) -> Result<StoreOutcome, FetchError> {
        let path = self.path_for(link);

        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| FetchError::io(path.clone(), e))?
        {
            info!(name = %link.name, "artifact already exists");
            return Ok(StoreOutcome::AlreadyPresent(path));
        }

        match self.client.fetch_to_file(&link.url, &path).await? {
            FileWrite::Written(_) => Ok(StoreOutcome::Stored(path)),
            FileWrite::Existing => {
                info!(name = %link.name, "artifact stored concurrently by another task");
                Ok(StoreOutcome::AlreadyPresent(path))
            }
        }
    }
}
