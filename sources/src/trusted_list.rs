//! Published trusted lists.
//!
//! A list is located by URL (`http://`, `https://`), `file://` URL or plain
//! path. Downloads go through the [`DocumentCache`]; the document is then
//! handed to the [`TrustedListParser`] for its format.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use trustval_types::{
    Certificate, FetchError, SourceDescriptor, TrustAnchorSet, TrustedListFormat,
    TrustedListLocator,
};

use crate::document_cache::DocumentCache;
use crate::error::SourceError;
use crate::pem::parse_pem_bundle;
use crate::source::TrustAnchorSource;

/// Turns a downloaded trusted-list document into anchor certificates.
pub trait TrustedListParser: Send + Sync {
    fn format(&self) -> TrustedListFormat;

    /// Whether this parser checks the list's signature against the
    /// locator's signature keystore.
    fn verifies_signatures(&self) -> bool {
        false
    }

    fn parse(
        &self,
        document: &[u8],
        locator: &TrustedListLocator,
    ) -> Result<Vec<Certificate>, FetchError>;
}

/// A list published as concatenated PEM certificates.
///
/// The bundle carries no per-entry service type, so every certificate in it
/// is returned regardless of the locator's service type.
#[derive(Clone, Copy, Debug, Default)]
pub struct PemBundleParser;

impl TrustedListParser for PemBundleParser {
    fn format(&self) -> TrustedListFormat {
        TrustedListFormat::PemBundle
    }

    fn parse(
        &self,
        document: &[u8],
        _locator: &TrustedListLocator,
    ) -> Result<Vec<Certificate>, FetchError> {
        parse_pem_bundle(document)
    }
}

pub struct TrustedListSource {
    client: reqwest::Client,
    documents: DocumentCache,
    parser: Arc<dyn TrustedListParser>,
}

impl TrustedListSource {
    /// `request_timeout` bounds every HTTP exchange, connect through body.
    pub fn new(documents: DocumentCache, request_timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SourceError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            documents,
            parser: Arc::new(PemBundleParser),
        })
    }

    pub fn with_parser(mut self, parser: Arc<dyn TrustedListParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn documents(&self) -> &DocumentCache {
        &self.documents
    }

    /// Reject locators this source could never serve.
    pub fn check(&self, locator: &TrustedListLocator) -> Result<(), SourceError> {
        self.supports(locator).map_err(|e| SourceError::TrustedList {
            location: locator.location.clone(),
            reason: e.to_string(),
        })
    }

    fn supports(&self, locator: &TrustedListLocator) -> Result<(), FetchError> {
        if locator.format != self.parser.format() {
            return Err(FetchError::Unsupported(format!(
                "no parser for trusted-list format {:?}",
                locator.format
            )));
        }
        if locator.signature_keystore.is_some() && !self.parser.verifies_signatures() {
            return Err(FetchError::Unsupported(format!(
                "signature verification is not available for {:?} trusted lists",
                locator.format
            )));
        }
        Ok(())
    }

    async fn download(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(path) = location.strip_prefix("file://") {
            return Ok(tokio::fs::read(path).await?);
        }
        if !(location.starts_with("http://") || location.starts_with("https://")) {
            return Ok(tokio::fs::read(location).await?);
        }

        info!(location, "downloading trusted list");
        let response = self
            .client
            .get(location)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl TrustAnchorSource for TrustedListSource {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        let SourceDescriptor::TrustedList(locator) = descriptor else {
            return Err(FetchError::Unsupported(descriptor.to_string()));
        };
        self.supports(locator)?;

        let document = self
            .documents
            .get_or_fetch(&locator.location, || self.download(&locator.location))
            .await?;
        let certs = self.parser.parse(&document, locator)?;
        debug!(source = %descriptor, anchors = certs.len(), "trusted list parsed");
        Ok(TrustAnchorSet::from_certificates(certs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trustval_types::{KeyStoreFormat, KeyStoreHandle, SystemClock};

    fn source(dir: &std::path::Path) -> TrustedListSource {
        let documents = DocumentCache::new(dir.join("cache"), 3600, Arc::new(SystemClock));
        TrustedListSource::new(documents, Duration::from_secs(5)).unwrap()
    }

    fn locator(location: String) -> TrustedListLocator {
        TrustedListLocator {
            location,
            signature_keystore: None,
            service_type: "http://uri.etsi.org/Svc/Svctype/Provider/PID".into(),
            format: TrustedListFormat::PemBundle,
        }
    }

    #[tokio::test]
    async fn reads_file_locations() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.pem");
        let cert = rcgen::generate_simple_self_signed(["pid.example".to_string()]).unwrap();
        std::fs::write(&list, cert.cert.pem()).unwrap();

        let source = source(dir.path());
        for location in [
            list.display().to_string(),
            format!("file://{}", list.display()),
        ] {
            let anchors = source
                .fetch(&SourceDescriptor::TrustedList(locator(location)))
                .await
                .unwrap();
            assert_eq!(anchors.len(), 1);
            assert_eq!(anchors[0].certificate().der(), cert.cert.der().as_ref());
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pem").display().to_string();
        let err = source(dir.path())
            .fetch(&SourceDescriptor::TrustedList(locator(missing)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn signed_list_needs_a_verifying_parser() {
        let dir = tempfile::tempdir().unwrap();
        let mut locator = locator("https://tl.example/list".into());
        locator.signature_keystore = Some(KeyStoreHandle {
            path: PathBuf::from("/etc/trustval/tl-signers.pem"),
            format: KeyStoreFormat::Pem,
            password: None,
        });
        let source = source(dir.path());

        assert!(source.check(&locator).is_err());
        let err = source
            .fetch(&SourceDescriptor::TrustedList(locator))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported(_)));
    }
}
