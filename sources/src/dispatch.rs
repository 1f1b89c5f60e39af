use std::sync::Arc;

use async_trait::async_trait;

use trustval_types::{FetchError, SourceDescriptor, TrustAnchorSet};

use crate::source::TrustAnchorSource;

/// Routes each descriptor to the source for its kind.
#[derive(Clone)]
pub struct AnchorSources {
    trusted_lists: Arc<dyn TrustAnchorSource>,
    keystores: Arc<dyn TrustAnchorSource>,
}

impl AnchorSources {
    pub fn new(
        trusted_lists: Arc<dyn TrustAnchorSource>,
        keystores: Arc<dyn TrustAnchorSource>,
    ) -> Self {
        Self {
            trusted_lists,
            keystores,
        }
    }
}

#[async_trait]
impl TrustAnchorSource for AnchorSources {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        match descriptor {
            SourceDescriptor::TrustedList(_) => self.trusted_lists.fetch(descriptor).await,
            SourceDescriptor::KeyStore(_) => self.keystores.fetch(descriptor).await,
        }
    }
}
