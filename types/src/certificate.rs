//! DER certificates and leaf-first chains.

use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::TypesError;

/// An X.509 certificate held as its DER encoding.
///
/// The bytes are parsed once on construction, so every `Certificate` is known
/// to be well-formed. Equality and hashing are over the DER bytes.
#[derive(Clone)]
pub struct Certificate {
    der: Arc<[u8]>,
    subject: Arc<str>,
}

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, TypesError> {
        let der: Vec<u8> = der.into();
        let subject = {
            let (_, cert) = x509_parser::parse_x509_certificate(&der)
                .map_err(|e| TypesError::MalformedCertificate(e.to_string()))?;
            cert.subject().to_string()
        };
        Ok(Self {
            der: der.into(),
            subject: subject.into(),
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// RFC 4514 rendering of the subject name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Hex SHA-256 of the DER encoding.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.der))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Certificate({}, {})",
            self.subject,
            &self.fingerprint()[..16]
        )
    }
}

/// An ordered, non-empty certificate chain, leaf first.
///
/// Order is preserved exactly as received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateChain(Vec<Certificate>);

impl CertificateChain {
    pub fn new(certs: Vec<Certificate>) -> Result<Self, TypesError> {
        if certs.is_empty() {
            return Err(TypesError::EmptyChain);
        }
        Ok(Self(certs))
    }

    /// Parse a leaf-first list of DER encodings.
    pub fn from_der_list<I, B>(ders: I) -> Result<Self, TypesError>
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let certs = ders
            .into_iter()
            .map(Certificate::from_der)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(certs)
    }

    pub fn leaf(&self) -> &Certificate {
        &self.0[0]
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}
