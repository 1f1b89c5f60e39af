//! Resolution strategies: one way of answering "is this chain trusted for
//! this context?".

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use trustval_cache::TtlCache;
use trustval_pkix::ChainValidator;
use trustval_types::{CertificateChain, Clock, FetchError, TrustDecision, VerificationContext};

use crate::router::{ContextRouter, SourceKind};

/// A strategy answers `Ok(None)` when it has no source for the context. A
/// fetch failure is returned as an error; rejecting the chain is an
/// `Ok(Some(NotTrusted))`.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    async fn decide(
        &self,
        chain: &CertificateChain,
        context: &VerificationContext,
    ) -> Result<Option<TrustDecision>, FetchError>;
}

/// Validates against the anchors of one kind of source, resolved through a
/// TTL cache.
pub struct SourceStrategy {
    kind: SourceKind,
    router: Arc<ContextRouter>,
    cache: Arc<TtlCache>,
    validator: ChainValidator,
    clock: Arc<dyn Clock>,
}

impl SourceStrategy {
    pub fn new(
        kind: SourceKind,
        router: Arc<ContextRouter>,
        cache: Arc<TtlCache>,
        validator: ChainValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            kind,
            router,
            cache,
            validator,
            clock,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

#[async_trait]
impl ResolutionStrategy for SourceStrategy {
    async fn decide(
        &self,
        chain: &CertificateChain,
        context: &VerificationContext,
    ) -> Result<Option<TrustDecision>, FetchError> {
        let routes = self.router.routes_for(context);
        let Some(descriptor) = routes.and_then(|routes| routes.get(self.kind)) else {
            return Ok(None);
        };
        let anchors = self.cache.resolve(descriptor).await?;

        let decision = match self.validator.validate(chain, &anchors, self.clock.now()) {
            Ok(anchor) => TrustDecision::Trusted(anchor),
            Err(e) => {
                debug!(
                    context = %context,
                    source = self.kind.as_str(),
                    reason = %e,
                    "chain rejected"
                );
                TrustDecision::not_trusted(e)
            }
        };
        Ok(Some(decision))
    }
}
