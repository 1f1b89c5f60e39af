//! Periodic refresh of the simple-profile trust store.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use trustval_sources::TrustAnchorSource;
use trustval_types::{Certificate, FetchError, SourceDescriptor};

use crate::config::ServiceTypeSourceConfig;
use crate::trust_store::TrustStore;

/// Feeds one service type's certificates into the [`TrustStore`] from a
/// trusted list and/or a keystore.
pub struct TrustStoreRefresher {
    config: ServiceTypeSourceConfig,
    descriptors: Vec<SourceDescriptor>,
    sources: Arc<dyn TrustAnchorSource>,
    store: Arc<TrustStore>,
}

impl TrustStoreRefresher {
    pub fn new(
        config: ServiceTypeSourceConfig,
        sources: Arc<dyn TrustAnchorSource>,
        store: Arc<TrustStore>,
    ) -> Self {
        let mut descriptors = Vec::new();
        if let Some(lotl) = &config.lotl {
            descriptors.push(SourceDescriptor::TrustedList(lotl.locator(config.provider_type)));
        }
        if let Some(keystore) = &config.keystore {
            descriptors.push(SourceDescriptor::KeyStore(keystore.selector()));
        }
        Self {
            config,
            descriptors,
            sources,
            store,
        }
    }

    pub fn descriptors(&self) -> &[SourceDescriptor] {
        &self.descriptors
    }

    /// Gather certificates from every source and store them. Sources that
    /// fail are skipped; if all fail the stored list is left untouched and
    /// the last error is returned.
    pub async fn refresh_once(&self) -> Result<usize, FetchError> {
        let mut certificates: Vec<Certificate> = Vec::new();
        let mut succeeded = false;
        let mut last_error = None;

        for descriptor in &self.descriptors {
            match self.sources.fetch(descriptor).await {
                Ok(anchors) => {
                    succeeded = true;
                    for anchor in anchors.iter() {
                        if !certificates.contains(anchor.certificate()) {
                            certificates.push(anchor.certificate().clone());
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        service_type = %self.config.provider_type,
                        source = %descriptor,
                        error = %e,
                        "trust store source failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        if !succeeded {
            return Err(last_error
                .unwrap_or_else(|| FetchError::Unsupported("no sources configured".into())));
        }
        let count = certificates.len();
        self.store.update(self.config.provider_type, certificates).await;
        Ok(count)
    }

    /// Refresh now and then every `refresh_interval_secs` until shutdown.
    pub fn spawn(self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.refresh_interval());
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!(service_type = %self.config.provider_type, "trust store refresher shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = self.refresh_once().await {
                            warn!(
                                service_type = %self.config.provider_type,
                                error = %e,
                                "trust store refresh failed, keeping previous certificates"
                            );
                        }
                    }
                }
            }
        })
    }
}
