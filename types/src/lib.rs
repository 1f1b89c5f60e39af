//! Fundamental types for the trust validator.
//!
//! This crate defines the values shared across every other crate in the workspace:
//! verification contexts, certificates and chains, trust anchors, source
//! descriptors, trust decisions, and timestamps.

pub mod anchor;
pub mod certificate;
pub mod context;
pub mod decision;
pub mod error;
pub mod source;
pub mod time;

pub use anchor::{GeneralSubtree, NameConstraints, TrustAnchor, TrustAnchorSet};
pub use certificate::{Certificate, CertificateChain};
pub use context::{ServiceType, VerificationContext};
pub use decision::TrustDecision;
pub use error::{FetchError, TypesError};
pub use source::{
    AliasPattern, KeyStoreFormat, KeyStoreHandle, KeyStoreSelector, Password, SourceDescriptor,
    TrustedListFormat, TrustedListLocator,
};
pub use time::{Clock, SystemClock, Timestamp};
