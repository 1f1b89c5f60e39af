use async_trait::async_trait;
use trustval_types::{FetchError, SourceDescriptor, TrustAnchorSet};

/// Produces the current trust anchors for a source descriptor.
///
/// Implementations bound their own I/O time; a hung fetch must end in a
/// [`FetchError`] rather than block its caller forever.
#[async_trait]
pub trait TrustAnchorSource: Send + Sync {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError>;
}
