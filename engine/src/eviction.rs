//! Periodic wipe of the on-disk trusted-list document cache.
//!
//! Best effort: a failed delete is logged and retried on the next tick.
//! The wipe takes the document cache's write lock, so it never overlaps a
//! download writing into the same directory.

use std::time::Duration;

use prometheus::IntCounter;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use trustval_sources::DocumentCache;

pub struct CacheEviction {
    documents: DocumentCache,
    interval: Duration,
    evictions: IntCounter,
}

impl CacheEviction {
    pub fn new(documents: DocumentCache, interval: Duration, evictions: IntCounter) -> Self {
        Self {
            documents,
            interval,
            evictions,
        }
    }

    /// Delete the cache directory once. Returns whether anything was deleted.
    pub async fn run_once(&self) -> bool {
        let dir = self.documents.dir().display().to_string();
        match self.documents.clear().await {
            Ok(true) => {
                self.evictions.inc();
                info!(dir = %dir, "trusted-list document cache cleared");
                true
            }
            Ok(false) => {
                info!(dir = %dir, "trusted-list document cache already empty");
                false
            }
            Err(e) => {
                warn!(dir = %dir, error = %e, "failed to clear trusted-list document cache");
                false
            }
        }
    }

    /// Clear now and then every `interval` until shutdown.
    pub fn spawn(self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("cache eviction shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.run_once().await;
                    }
                }
            }
        })
    }
}
