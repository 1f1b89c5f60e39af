//! Certification path validation (RFC 5280).
//!
//! [`ChainValidator`] checks a leaf-first [`CertificateChain`] against a
//! [`TrustAnchorSet`] and returns the anchor the path terminates at.
//! Revocation checking is a policy switch; this crate has no OCSP/CRL client,
//! so enabling it makes every validation fail closed.
//!
//! [`CertificateChain`]: trustval_types::CertificateChain
//! [`TrustAnchorSet`]: trustval_types::TrustAnchorSet

pub mod error;
pub mod name_constraints;
pub mod validator;

pub use error::PathValidationError;
pub use validator::{ChainValidator, ValidationPolicy};
