//! Throwaway PKI for tests: roots, intermediates and leaves built with rcgen.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose,
};
use trustval_types::{Certificate, CertificateChain, TrustAnchor, TrustAnchorSet};

/// A generated certificate together with its private key.
pub struct TestCert {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

impl TestCert {
    /// A self-signed CA with keyCertSign.
    pub fn root(cn: &str) -> Self {
        let key = KeyPair::generate().expect("key generation");
        let cert = ca_params(cn, BasicConstraints::Unconstrained)
            .self_signed(&key)
            .expect("self-signed root");
        Self { cert, key }
    }

    /// Sign `params` with this certificate's key.
    pub fn issue(&self, params: CertificateParams) -> TestCert {
        let key = KeyPair::generate().expect("key generation");
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .expect("signed certificate");
        TestCert { cert, key }
    }

    /// An end-entity certificate for `dns_name`.
    pub fn leaf(&self, dns_name: &str) -> TestCert {
        self.issue(leaf_params(dns_name))
    }

    /// An unconstrained intermediate CA.
    pub fn intermediate(&self, cn: &str) -> TestCert {
        self.issue(ca_params(cn, BasicConstraints::Unconstrained))
    }

    pub fn certificate(&self) -> Certificate {
        Certificate::from_der(self.cert.der().to_vec()).expect("rcgen emits valid DER")
    }

    pub fn anchor(&self) -> TrustAnchor {
        TrustAnchor::new(self.certificate())
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }
}

/// Parameters with a fresh distinguished name and the given DNS SANs.
pub fn params(cn: &str, dns_names: &[&str]) -> CertificateParams {
    let sans: Vec<String> = dns_names.iter().map(|s| s.to_string()).collect();
    let mut params = CertificateParams::new(sans).expect("valid subject alt names");
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params
}

pub fn ca_params(cn: &str, constraint: BasicConstraints) -> CertificateParams {
    let mut params = params(cn, &[]);
    params.is_ca = IsCa::Ca(constraint);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params
}

pub fn leaf_params(dns_name: &str) -> CertificateParams {
    let mut params = params(dns_name, &[dns_name]);
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params
}

pub fn chain(certs: &[&TestCert]) -> CertificateChain {
    CertificateChain::new(certs.iter().map(|c| c.certificate()).collect())
        .expect("non-empty chain")
}

pub fn anchors(certs: &[&TestCert]) -> TrustAnchorSet {
    certs.iter().map(|c| c.anchor()).collect()
}
