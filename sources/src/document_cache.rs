//! On-disk cache of downloaded trusted-list documents.
//!
//! Documents live in one directory, one file per location, named by the
//! SHA-256 of the location. A file younger than the document TTL (by its
//! modification time) is served instead of downloading again.
//!
//! Reads and writes hold a shared lock; [`DocumentCache::clear`] takes it
//! exclusively, so an eviction never races a download into the directory.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use trustval_types::{Clock, FetchError, Timestamp};

#[derive(Clone)]
pub struct DocumentCache {
    dir: PathBuf,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
    lock: Arc<RwLock<()>>,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            ttl_secs,
            clock,
            lock: Arc::new(RwLock::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// File that holds the cached copy of `location`.
    pub fn path_for(&self, location: &str) -> PathBuf {
        self.dir.join(hex::encode(Sha256::digest(location.as_bytes())))
    }

    /// Return the cached document for `location` if it is fresh, otherwise
    /// run `download`, store its result and return it.
    ///
    /// A failed write is logged and does not fail the lookup.
    pub async fn get_or_fetch<F, Fut>(&self, location: &str, download: F) -> Result<Vec<u8>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, FetchError>>,
    {
        let _guard = self.lock.read().await;
        let path = self.path_for(location);

        if let Some(document) = self.read_fresh(&path).await {
            debug!(location, "trusted list served from document cache");
            return Ok(document);
        }

        let document = download().await?;
        if let Err(e) = self.store(&path, &document).await {
            warn!(location, error = %e, "failed to write document cache");
        }
        Ok(document)
    }

    /// Delete the cache directory and everything in it.
    ///
    /// Returns `false` when there was nothing to delete.
    pub async fn clear(&self) -> std::io::Result<bool> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_fresh(&self, path: &Path) -> Option<Vec<u8>> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        let written = Timestamp::new(modified.as_secs());
        if written.is_older_than(self.ttl_secs, self.clock.now()) {
            return None;
        }
        tokio::fs::read(path).await.ok()
    }

    /// Write through a uniquely named temporary file so concurrent
    /// downloads of one location never publish a partial document.
    async fn store(&self, path: &Path, document: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let dir = self.dir.clone();
        let path = path.to_path_buf();
        let document = document.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&document)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok::<(), std::io::Error>(())
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("dir", &self.dir)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
