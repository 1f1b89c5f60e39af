//! Error types shared across crates.

use thiserror::Error;

/// Errors raised while constructing the fundamental values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("certificate chain must contain at least one certificate")]
    EmptyChain,

    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("invalid alias pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown service type: {0}")]
    UnknownServiceType(String),
}

/// Retrieving the anchors of one source descriptor failed.
///
/// Cloneable so that every caller waiting on the same refresh observes the
/// same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch of {descriptor} timed out after {secs}s")]
    Timeout { descriptor: String, secs: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("keystore error: {0}")]
    KeyStore(String),

    #[error("unsupported source: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e.to_string())
    }
}
