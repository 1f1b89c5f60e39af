use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up a source, before any fetch happens.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("keystore {path}: {reason}")]
    KeyStore { path: PathBuf, reason: String },

    #[error("keystore format '{0}' is not supported (use 'pem' or 'dir')")]
    UnsupportedKeyStoreFormat(&'static str),

    #[error("trusted list {location}: {reason}")]
    TrustedList { location: String, reason: String },
}
