//! The path validation algorithm.
//!
//! Path construction is deliberately simple: the presented chain is taken in
//! order and truncated at the first certificate that is itself a trust
//! anchor. Otherwise every anchor whose subject matches the top
//! certificate's issuer and whose key verifies its signature is tried in
//! turn; the path is rejected with the last failure when none validates.

use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use trustval_types::{
    Certificate, CertificateChain, NameConstraints, Timestamp, TrustAnchor, TrustAnchorSet,
};

use crate::name_constraints::{self, CertNames};
use crate::PathValidationError;

/// Longest chain accepted, leaf included.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Tunable validation policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// OCSP/CRL checking. Off by default.
    pub revocation_enabled: bool,
}

/// Validates certificate chains against trust-anchor sets.
#[derive(Clone, Debug, Default)]
pub struct ChainValidator {
    policy: ValidationPolicy,
}

impl ChainValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Validate `chain` at time `now`, returning the anchor it terminates at.
    pub fn validate(
        &self,
        chain: &CertificateChain,
        anchors: &TrustAnchorSet,
        now: Timestamp,
    ) -> Result<TrustAnchor, PathValidationError> {
        if anchors.is_empty() {
            return Err(PathValidationError::NoTrustAnchors);
        }
        if self.policy.revocation_enabled {
            return Err(PathValidationError::RevocationUnsupported);
        }
        if chain.len() > MAX_CHAIN_DEPTH {
            return Err(PathValidationError::ChainTooLong {
                max: MAX_CHAIN_DEPTH,
            });
        }

        let certs = chain.certificates();

        // A chain certificate that is an anchor ends the path there. The
        // anchor was presented, so its own validity period applies.
        for (i, cert) in certs.iter().enumerate() {
            if let Some(anchor) = anchors.iter().find(|a| a.certificate() == cert) {
                let anchor_cert = parse_anchor(anchor)?;
                check_validity(&anchor_cert, i, now)?;
                if i == 0 {
                    if is_self_issued(&anchor_cert) && anchor_cert.verify_signature(None).is_err() {
                        return Err(PathValidationError::SignatureInvalid {
                            depth: 0,
                            subject: cert.subject().to_string(),
                        });
                    }
                    debug!(subject = cert.subject(), "leaf is a trust anchor");
                    return Ok(anchor.clone());
                }
                let path = parse_path(&certs[..i])?;
                validate_path(&path, anchor, &anchor_cert, now)?;
                return Ok(anchor.clone());
            }
        }

        let path = parse_path(certs)?;
        let top_depth = path.len() - 1;
        let top = &path[top_depth];
        let mut last_error = None;
        for anchor in anchors.iter() {
            let anchor_cert = match parse_anchor(anchor) {
                Ok(anchor_cert) => anchor_cert,
                Err(e) => {
                    debug!(
                        subject = anchor.certificate().subject(),
                        error = %e,
                        "anchor skipped"
                    );
                    continue;
                }
            };
            if anchor_cert.subject().as_raw() != top.issuer().as_raw() {
                continue;
            }
            if top
                .verify_signature(Some(anchor_cert.public_key()))
                .is_err()
            {
                continue;
            }
            match validate_path(&path, anchor, &anchor_cert, now) {
                Ok(()) => return Ok(anchor.clone()),
                Err(e) => {
                    debug!(
                        anchor = anchor.certificate().subject(),
                        error = %e,
                        "path rejected under anchor"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PathValidationError::NoMatchingAnchor {
            depth: top_depth,
            subject: top.subject().to_string(),
        }))
    }
}

fn parse_path(certs: &[Certificate]) -> Result<Vec<X509Certificate<'_>>, PathValidationError> {
    certs
        .iter()
        .enumerate()
        .map(|(depth, c)| {
            X509Certificate::from_der(c.der())
                .map(|(_, x509)| x509)
                .map_err(|e| PathValidationError::Malformed {
                    depth,
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn parse_anchor(anchor: &TrustAnchor) -> Result<X509Certificate<'_>, PathValidationError> {
    X509Certificate::from_der(anchor.certificate().der())
        .map(|(_, x509)| x509)
        .map_err(|e| PathValidationError::MalformedAnchor(e.to_string()))
}

/// Walk `path` from the certificate issued by the anchor down to the leaf.
fn validate_path(
    path: &[X509Certificate<'_>],
    anchor: &TrustAnchor,
    anchor_cert: &X509Certificate<'_>,
    now: Timestamp,
) -> Result<(), PathValidationError> {
    let mut constraints: Vec<NameConstraints> =
        anchor.name_constraints().cloned().into_iter().collect();

    for depth in (0..path.len()).rev() {
        let cert = &path[depth];
        let issuer = path.get(depth + 1).unwrap_or(anchor_cert);
        let subject = || cert.subject().to_string();

        if cert.issuer().as_raw() != issuer.subject().as_raw() {
            return Err(PathValidationError::IssuerMismatch {
                depth,
                subject: subject(),
            });
        }
        if cert.verify_signature(Some(issuer.public_key())).is_err() {
            return Err(PathValidationError::SignatureInvalid {
                depth,
                subject: subject(),
            });
        }

        check_validity(cert, depth, now)?;

        if let Some(ext) = cert
            .extensions()
            .iter()
            .find(|e| e.critical && !is_known_extension(&e.oid.to_id_string()))
        {
            return Err(PathValidationError::UnknownCriticalExtension {
                depth,
                oid: ext.oid.to_id_string(),
            });
        }

        // Self-issued intermediates are exempt (RFC 5280 §6.1.3(b)).
        if depth == 0 || !is_self_issued(cert) {
            let names = CertNames::of(cert);
            for nc in &constraints {
                name_constraints::check(nc, &names)
                    .map_err(|name| PathValidationError::NameConstraintViolation { depth, name })?;
            }
        }

        if depth > 0 {
            check_ca(path, depth)?;
            if let Ok(Some(nc)) = cert.name_constraints() {
                constraints.push(name_constraints::from_extension(nc.value));
            }
        }
    }
    Ok(())
}

fn check_validity(
    cert: &X509Certificate<'_>,
    depth: usize,
    now: Timestamp,
) -> Result<(), PathValidationError> {
    let now = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
    let validity = cert.validity();
    if now < validity.not_before.timestamp() {
        return Err(PathValidationError::NotYetValid {
            depth,
            subject: cert.subject().to_string(),
        });
    }
    if now > validity.not_after.timestamp() {
        return Err(PathValidationError::Expired {
            depth,
            subject: cert.subject().to_string(),
        });
    }
    Ok(())
}

/// Basic constraints, path length and key usage of an issuing certificate.
fn check_ca(path: &[X509Certificate<'_>], depth: usize) -> Result<(), PathValidationError> {
    let cert = &path[depth];
    let subject = || cert.subject().to_string();

    match cert.basic_constraints().ok().flatten().map(|bc| bc.value) {
        Some(bc) if bc.ca => {
            if let Some(max) = bc.path_len_constraint {
                let below = path[1..depth]
                    .iter()
                    .filter(|c| !is_self_issued(c))
                    .count();
                if below as u64 > u64::from(max) {
                    return Err(PathValidationError::PathLenExceeded {
                        depth,
                        subject: subject(),
                    });
                }
            }
        }
        _ => {
            return Err(PathValidationError::NotCa {
                depth,
                subject: subject(),
            })
        }
    }

    if let Ok(Some(ku)) = cert.key_usage() {
        if !ku.value.key_cert_sign() {
            return Err(PathValidationError::KeyCertSignMissing {
                depth,
                subject: subject(),
            });
        }
    }
    Ok(())
}

fn is_self_issued(cert: &X509Certificate<'_>) -> bool {
    cert.subject().as_raw() == cert.issuer().as_raw()
}

/// Extensions this validator understands or may safely ignore when critical.
fn is_known_extension(oid: &str) -> bool {
    matches!(
        oid,
        "2.5.29.14" // Subject Key Identifier
        | "2.5.29.15" // Key Usage
        | "2.5.29.17" // Subject Alternative Name
        | "2.5.29.18" // Issuer Alternative Name
        | "2.5.29.19" // Basic Constraints
        | "2.5.29.30" // Name Constraints
        | "2.5.29.31" // CRL Distribution Points
        | "2.5.29.32" // Certificate Policies
        | "2.5.29.35" // Authority Key Identifier
        | "2.5.29.37" // Extended Key Usage
        | "1.3.6.1.5.5.7.1.1" // Authority Info Access
        | "1.3.6.1.5.5.7.1.3" // QC Statements
    )
}
