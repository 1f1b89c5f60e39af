//! Composition of two strategies where either may vouch for a chain.

use async_trait::async_trait;
use prometheus::IntCounter;
use tracing::warn;

use trustval_types::{CertificateChain, FetchError, TrustDecision, VerificationContext};

use crate::strategy::ResolutionStrategy;

/// Tries `primary`, then `secondary` unless the primary already trusts the
/// chain. A failing strategy counts as "not trusted by this source", so the
/// composed strategy never returns an error.
///
/// Precedence: a `Trusted` from either side wins, primary first. Otherwise
/// the primary's answer is returned if it had one, else the secondary's.
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
    failures: Option<IntCounter>,
}

impl<P, S> Fallback<P, S>
where
    P: ResolutionStrategy,
    S: ResolutionStrategy,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            failures: None,
        }
    }

    /// Count every captured strategy failure on `counter`.
    pub fn with_failure_counter(mut self, counter: IntCounter) -> Self {
        self.failures = Some(counter);
        self
    }

    async fn attempt<T: ResolutionStrategy>(
        &self,
        strategy: &T,
        role: &'static str,
        chain: &CertificateChain,
        context: &VerificationContext,
    ) -> Option<TrustDecision> {
        match strategy.decide(chain, context).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(context = %context, role, error = %e, "trust source failed, treating as not trusted");
                if let Some(counter) = &self.failures {
                    counter.inc();
                }
                Some(TrustDecision::not_trusted(e))
            }
        }
    }
}

#[async_trait]
impl<P, S> ResolutionStrategy for Fallback<P, S>
where
    P: ResolutionStrategy,
    S: ResolutionStrategy,
{
    async fn decide(
        &self,
        chain: &CertificateChain,
        context: &VerificationContext,
    ) -> Result<Option<TrustDecision>, FetchError> {
        let primary = self.attempt(&self.primary, "primary", chain, context).await;
        if matches!(primary, Some(TrustDecision::Trusted(_))) {
            return Ok(primary);
        }

        let secondary = self.attempt(&self.secondary, "secondary", chain, context).await;
        if matches!(secondary, Some(TrustDecision::Trusted(_))) {
            return Ok(secondary);
        }
        Ok(primary.or(secondary))
    }
}
