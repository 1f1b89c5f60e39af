//! Trust validator lifecycle: build from configuration, start the background
//! tasks and the HTTP server, stop them again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use trustval_pkix::ValidationPolicy;
use trustval_rpc::RpcServer;
use trustval_sources::{
    AnchorSources, DocumentCache, KeyStore, KeyStoreSource, TrustAnchorSource, TrustedListSource,
};
use trustval_types::{Clock, SourceDescriptor, SystemClock};
use trustval_utils::format_duration;

use crate::config::ValidatorConfig;
use crate::engine::TrustEngine;
use crate::eviction::CacheEviction;
use crate::metrics::ValidatorMetrics;
use crate::refresher::TrustStoreRefresher;
use crate::router::ContextRouter;
use crate::shutdown::ShutdownController;
use crate::trust_store::TrustStore;
use crate::{ConfigError, EngineError};

/// How long `stop` waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TrustValidator {
    config: ValidatorConfig,
    engine: Arc<TrustEngine>,
    sources: Arc<dyn TrustAnchorSource>,
    trust_store: Arc<TrustStore>,
    documents: DocumentCache,
    metrics: Arc<ValidatorMetrics>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl TrustValidator {
    /// Build a validator reading trusted lists over HTTP(S) and keystores
    /// from disk. Any configuration problem is returned here, before
    /// anything is started.
    pub fn new(config: ValidatorConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let documents = document_cache(&config, clock.clone());

        let fetch_timeout = Duration::from_secs(config.cache.fetch_timeout_secs);
        let trusted_lists = TrustedListSource::new(documents.clone(), fetch_timeout)
            .map_err(|source| ConfigError::Source {
                field: "cache".into(),
                source,
            })?;
        for descriptor in trusted_list_descriptors(&config) {
            if let SourceDescriptor::TrustedList(locator) = &descriptor {
                trusted_lists
                    .check(locator)
                    .map_err(|source| ConfigError::Source {
                        field: descriptor.to_string(),
                        source,
                    })?;
            }
        }

        let sources = Arc::new(AnchorSources::new(
            Arc::new(trusted_lists),
            Arc::new(KeyStoreSource::new()),
        ));
        Self::build(config, sources, clock, documents)
    }

    /// Build a validator over caller-supplied sources and clock.
    pub fn with_sources(
        config: ValidatorConfig,
        sources: Arc<dyn TrustAnchorSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let documents = document_cache(&config, clock.clone());
        Self::build(config, sources, clock, documents)
    }

    fn build(
        config: ValidatorConfig,
        sources: Arc<dyn TrustAnchorSource>,
        clock: Arc<dyn Clock>,
        documents: DocumentCache,
    ) -> Result<Self, EngineError> {
        let router = Arc::new(ContextRouter::from_config(&config.trust_sources));
        if router.is_empty() && config.service_type_sources.is_empty() {
            warn!("no trust sources configured, every trust query will fail");
        }

        let settings = config.cache.anchor_cache_settings();
        info!(
            anchor_ttl = %format_duration(settings.ttl_secs),
            fetch_timeout_secs = config.cache.fetch_timeout_secs,
            on_refresh_failure = %settings.stale_policy,
            "anchor caches configured"
        );
        let policy = ValidationPolicy {
            revocation_enabled: config.validation.revocation_enabled,
        };
        if policy.revocation_enabled {
            warn!("revocation checking is enabled but unsupported, every chain will be rejected");
        }

        let metrics = Arc::new(ValidatorMetrics::new());
        let trust_store = Arc::new(TrustStore::new());
        let engine = Arc::new(TrustEngine::new(
            router,
            sources.clone(),
            trust_store.clone(),
            clock,
            settings,
            policy,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            engine,
            sources,
            trust_store,
            documents,
            metrics,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<TrustEngine> {
        self.engine.clone()
    }

    pub fn trust_store(&self) -> &Arc<TrustStore> {
        &self.trust_store
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Spawn cache eviction, the trust-store refreshers and the HTTP server.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        self.log_keystore_aliases().await;

        // ── Document cache eviction ──────────────────────────────────────
        let eviction = CacheEviction::new(
            self.documents.clone(),
            Duration::from_secs(self.config.cache.eviction_interval_secs),
            self.metrics.cache_evictions.clone(),
        );
        info!(
            dir = %self.documents.dir().display(),
            every = %format_duration(self.config.cache.eviction_interval_secs),
            "document cache eviction scheduled"
        );
        self.task_handles.push(eviction.spawn(self.shutdown.subscribe()));

        // ── Simple-profile trust store ───────────────────────────────────
        for source in &self.config.service_type_sources {
            info!(
                service_type = %source.provider_type,
                every = %format_duration(source.refresh_interval_secs),
                "trust store refresh scheduled"
            );
            let refresher =
                TrustStoreRefresher::new(source.clone(), self.sources.clone(), self.trust_store.clone());
            self.task_handles.push(refresher.spawn(self.shutdown.subscribe()));
        }

        // ── HTTP server ──────────────────────────────────────────────────
        let server = RpcServer::new(
            self.config.listen_addr(),
            self.engine.clone(),
            self.config.cors.layer(),
        );
        let shutdown = self.shutdown.clone();
        let signalled = self.shutdown.signalled();
        self.task_handles.push(tokio::spawn(async move {
            if let Err(e) = server.serve(signalled).await {
                error!(error = %e, "HTTP server failed");
                shutdown.shutdown();
            }
        }));

        info!("trust validator started");
        Ok(())
    }

    /// Signal shutdown and wait for every task, at most `SHUTDOWN_TIMEOUT`.
    pub async fn stop(&mut self) {
        info!("stopping trust validator");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            warn!("shutdown timeout ({SHUTDOWN_TIMEOUT:?}), some tasks may still be running");
        }
        info!("trust validator stopped");
    }

    async fn log_keystore_aliases(&self) {
        let Some(keystore) = &self.config.trust_sources.key_store else {
            return;
        };
        match KeyStore::load(&keystore.handle()).await {
            Ok(loaded) => {
                let aliases: Vec<&str> = loaded
                    .aliases()
                    .filter(|alias| keystore.alias_pattern.is_match(alias))
                    .collect();
                info!(
                    path = %keystore.location.display(),
                    aliases = ?aliases,
                    "keystore loaded"
                );
            }
            Err(e) => warn!(path = %keystore.location.display(), error = %e, "keystore not loadable"),
        }
    }
}

fn document_cache(config: &ValidatorConfig, clock: Arc<dyn Clock>) -> DocumentCache {
    DocumentCache::new(
        config.cache.location.clone(),
        config.cache.document_ttl_secs,
        clock,
    )
}

/// Every trusted list the validator may fetch: routed lists and the lists of
/// simple-profile sources.
fn trusted_list_descriptors(config: &ValidatorConfig) -> Vec<SourceDescriptor> {
    let mut descriptors: Vec<SourceDescriptor> = config
        .trust_sources
        .trusted_lists()
        .flat_map(|(_, list)| [list.issuance(), list.revocation()])
        .map(SourceDescriptor::TrustedList)
        .collect();
    descriptors.extend(config.service_type_sources.iter().filter_map(|source| {
        source
            .lotl
            .as_ref()
            .map(|lotl| SourceDescriptor::TrustedList(lotl.locator(source.provider_type)))
    }));
    descriptors
}
