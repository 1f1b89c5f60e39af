//! Trust anchors and anchor sets.

use std::ops::Deref;
use std::sync::Arc;

use crate::Certificate;

/// One subtree of a name constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneralSubtree {
    /// `example.com` matches the domain and its subdomains; `.example.com`
    /// matches subdomains only.
    Dns(String),
    /// A full mailbox, a host, or a `.domain` suffix.
    Email(String),
    /// Address followed by mask: 8 bytes for IPv4, 32 for IPv6.
    IpAddress(Vec<u8>),
    /// Leading RDNs of a distinguished name. Each RDN is a sorted set of
    /// `(attribute OID, value)` pairs, values lower-cased with whitespace
    /// collapsed.
    DirectoryName(Vec<Vec<(String, String)>>),
    /// `host.example.com` matches that URI host; `.example.com` its
    /// subdomains.
    Uri(String),
    /// A name form that is not enforced. A constraint carrying one rejects
    /// every certificate it applies to.
    Unsupported(String),
}

/// Permitted and excluded name subtrees (RFC 5280 §4.2.1.10).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NameConstraints {
    pub permitted: Vec<GeneralSubtree>,
    pub excluded: Vec<GeneralSubtree>,
}

impl NameConstraints {
    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty() && self.excluded.is_empty()
    }
}

/// A trusted root certificate plus optional name constraints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrustAnchor {
    certificate: Certificate,
    name_constraints: Option<NameConstraints>,
}

impl TrustAnchor {
    pub fn new(certificate: Certificate) -> Self {
        Self {
            certificate,
            name_constraints: None,
        }
    }

    pub fn with_name_constraints(mut self, constraints: NameConstraints) -> Self {
        self.name_constraints = Some(constraints);
        self
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn name_constraints(&self) -> Option<&NameConstraints> {
        self.name_constraints.as_ref()
    }
}

impl From<Certificate> for TrustAnchor {
    fn from(certificate: Certificate) -> Self {
        Self::new(certificate)
    }
}

/// The anchors valid for one source descriptor at one point in time.
///
/// Immutable and cheap to clone. A refresh builds a new set and swaps it in
/// whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustAnchorSet(Arc<[TrustAnchor]>);

impl TrustAnchorSet {
    pub fn new(anchors: Vec<TrustAnchor>) -> Self {
        Self(anchors.into())
    }

    pub fn from_certificates(certs: impl IntoIterator<Item = Certificate>) -> Self {
        Self::new(certs.into_iter().map(TrustAnchor::new).collect())
    }

    pub fn contains_certificate(&self, cert: &Certificate) -> bool {
        self.0.iter().any(|a| a.certificate() == cert)
    }
}

impl Deref for TrustAnchorSet {
    type Target = [TrustAnchor];

    fn deref(&self) -> &[TrustAnchor] {
        &self.0
    }
}

impl FromIterator<TrustAnchor> for TrustAnchorSet {
    fn from_iter<I: IntoIterator<Item = TrustAnchor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
