//! The query side of the validator: routing, fallback and the simple-profile
//! trust store behind the [`TrustQueryService`] the HTTP layer calls.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use trustval_cache::{CacheSettings, TtlCache};
use trustval_pkix::{ChainValidator, ValidationPolicy};
use trustval_rpc::{RpcError, TrustQueryService};
use trustval_sources::TrustAnchorSource;
use trustval_types::{CertificateChain, Clock, ServiceType, TrustDecision, VerificationContext};

use crate::fallback::Fallback;
use crate::metrics::ValidatorMetrics;
use crate::router::{ContextRouter, SourceKind};
use crate::strategy::{ResolutionStrategy, SourceStrategy};
use crate::trust_store::TrustStore;
use crate::verify_trust::VerifyTrust;
use crate::EngineError;

pub struct TrustEngine {
    router: Arc<ContextRouter>,
    strategy: Fallback<SourceStrategy, SourceStrategy>,
    caches: [Arc<TtlCache>; 2],
    verify_trust: VerifyTrust,
    metrics: Arc<ValidatorMetrics>,
}

impl TrustEngine {
    /// Wire the engine. Trusted lists and keystores get separate anchor
    /// caches sharing `settings`; the trusted list is consulted first.
    pub fn new(
        router: Arc<ContextRouter>,
        sources: Arc<dyn TrustAnchorSource>,
        store: Arc<TrustStore>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
        policy: ValidationPolicy,
        metrics: Arc<ValidatorMetrics>,
    ) -> Self {
        let cache = |name: &'static str| {
            Arc::new(TtlCache::new(name, sources.clone(), clock.clone(), settings))
        };
        let trusted_lists = cache("trusted_lists");
        let key_stores = cache("key_stores");

        let source_strategy = |kind, cache: &Arc<TtlCache>| {
            SourceStrategy::new(
                kind,
                router.clone(),
                cache.clone(),
                ChainValidator::new(policy),
                clock.clone(),
            )
        };
        let strategy = Fallback::new(
            source_strategy(SourceKind::TrustedList, &trusted_lists),
            source_strategy(SourceKind::KeyStore, &key_stores),
        )
        .with_failure_counter(metrics.source_failures.clone());

        Self {
            router,
            strategy,
            caches: [trusted_lists, key_stores],
            verify_trust: VerifyTrust::new(store, clock),
            metrics,
        }
    }

    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    pub fn caches(&self) -> &[Arc<TtlCache>] {
        &self.caches
    }

    pub fn metrics(&self) -> &ValidatorMetrics {
        &self.metrics
    }

    /// Decide whether `chain` is trusted for `context`.
    ///
    /// Source failures and rejected paths are `NotTrusted`. An error means
    /// no source is configured for the context at all.
    pub async fn is_chain_trusted(
        &self,
        chain: &CertificateChain,
        context: &VerificationContext,
    ) -> Result<TrustDecision, EngineError> {
        self.metrics.queries.inc();
        // The fallback captures every strategy failure.
        let decision = self
            .strategy
            .decide(chain, context)
            .await
            .unwrap_or_else(|e| Some(TrustDecision::not_trusted(e)));

        match decision {
            Some(decision) => {
                if decision.is_trusted() {
                    self.metrics.trusted.inc();
                } else {
                    self.metrics.not_trusted.inc();
                }
                debug!(context = %context, trusted = decision.is_trusted(), "trust decision");
                Ok(decision)
            }
            None if self.router.is_empty() => Err(EngineError::NoTrustSources(context.clone())),
            None => Err(EngineError::UnknownContext(context.clone())),
        }
    }

    pub async fn verify_service_type(
        &self,
        chain: &CertificateChain,
        service_type: ServiceType,
    ) -> Result<bool, EngineError> {
        self.verify_trust.verify(service_type, chain).await
    }

    pub fn render_metrics(&self) -> String {
        for cache in &self.caches {
            self.metrics.observe_cache(cache);
        }
        self.metrics.render()
    }
}

#[async_trait]
impl TrustQueryService for TrustEngine {
    async fn is_chain_trusted(
        &self,
        chain: CertificateChain,
        context: VerificationContext,
    ) -> Result<TrustDecision, RpcError> {
        Ok(TrustEngine::is_chain_trusted(self, &chain, &context).await?)
    }

    async fn verify_service_type(
        &self,
        chain: CertificateChain,
        service_type: ServiceType,
    ) -> Result<bool, RpcError> {
        Ok(TrustEngine::verify_service_type(self, &chain, service_type).await?)
    }

    fn render_metrics(&self) -> String {
        TrustEngine::render_metrics(self)
    }
}
