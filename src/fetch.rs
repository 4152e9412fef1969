//! Streams a captured asset URL to its destination file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Moves bytes from the catalog to disk.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Downloads `url` into `dest`, creating parent directories.
    ///
    /// On error nothing is left at `dest`. When this returns `Ok` the file is
    /// flushed and closed.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;

    /// Cheap reachability check for a page before it is rendered.
    async fn is_reachable(&self, _url: &str) -> bool {
        true
    }
}

/// Upper bound on a reachability HEAD request.
pub const DEFAULT_REACHABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AssetFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    reachability_timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::default())
    }
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            reachability_timeout: DEFAULT_REACHABILITY_TIMEOUT,
        }
    }

    pub fn with_reachability_timeout(mut self, timeout: Duration) -> Self {
        self.reachability_timeout = timeout;
        self
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    /// Streams `url` into a file created at `dest`.
    ///
    /// # Arguments
    ///
    /// * `url` - absolute asset URL, fetched with a plain GET.
    /// * `dest` - file to create; its parent directories are created first.
    ///
    /// # Errors
    ///
    /// * [`FetchError::Io`] when `dest` already exists or cannot be written.
    /// * [`FetchError::Http`] when the connection fails or the body is cut short.
    /// * [`FetchError::Status`] for a non-success response.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await?;
        let guard = PartialFile::new(dest);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        guard.keep();
        debug!("wrote {written} bytes to {}", dest.display());
        Ok(())
    }

    async fn is_reachable(&self, url: &str) -> bool {
        let request = self.client.head(url).timeout(self.reachability_timeout);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("reachability check of {url} failed: {e}");
                false
            }
        }
    }
}

/// Removes a file on drop unless [`PartialFile::keep`] is called.
///
/// Covers both error returns and a fetch future that is dropped mid-stream.
struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    fn new(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && let Err(e) = std::fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("could not remove partial file {}: {e}", path.display());
        }
    }
}
