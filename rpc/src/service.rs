use async_trait::async_trait;

use trustval_types::{CertificateChain, ServiceType, TrustDecision, VerificationContext};

use crate::error::RpcError;

/// What the HTTP layer needs from the trust engine.
#[async_trait]
pub trait TrustQueryService: Send + Sync + 'static {
    /// Decide whether `chain` is trusted for `context`.
    async fn is_chain_trusted(
        &self,
        chain: CertificateChain,
        context: VerificationContext,
    ) -> Result<TrustDecision, RpcError>;

    /// Simple profile: decide whether `chain` is trusted by the roots
    /// currently stored for `service_type`.
    async fn verify_service_type(
        &self,
        chain: CertificateChain,
        service_type: ServiceType,
    ) -> Result<bool, RpcError>;

    /// Prometheus text exposition of the engine's metrics.
    fn render_metrics(&self) -> String;
}
