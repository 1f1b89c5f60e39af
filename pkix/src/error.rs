use thiserror::Error;

/// Why a chain failed path validation.
///
/// `depth` counts from the leaf (depth 0) towards the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathValidationError {
    #[error("trust anchor set is empty")]
    NoTrustAnchors,

    #[error("revocation checking is enabled but not supported")]
    RevocationUnsupported,

    #[error("certificate chain exceeds maximum depth of {max}")]
    ChainTooLong { max: usize },

    #[error("certificate at depth {depth} is malformed: {reason}")]
    Malformed { depth: usize, reason: String },

    #[error("trust anchor is malformed: {0}")]
    MalformedAnchor(String),

    #[error("no trust anchor issued certificate at depth {depth} ({subject})")]
    NoMatchingAnchor { depth: usize, subject: String },

    #[error("signature of certificate at depth {depth} ({subject}) does not verify")]
    SignatureInvalid { depth: usize, subject: String },

    #[error("issuer of certificate at depth {depth} ({subject}) does not match the next subject")]
    IssuerMismatch { depth: usize, subject: String },

    #[error("certificate at depth {depth} ({subject}) is not yet valid")]
    NotYetValid { depth: usize, subject: String },

    #[error("certificate at depth {depth} ({subject}) has expired")]
    Expired { depth: usize, subject: String },

    #[error("certificate at depth {depth} ({subject}) is not a CA but is used as issuer")]
    NotCa { depth: usize, subject: String },

    #[error("certificate at depth {depth} ({subject}) path length constraint violated")]
    PathLenExceeded { depth: usize, subject: String },

    #[error("certificate at depth {depth} ({subject}) is a CA without keyCertSign")]
    KeyCertSignMissing { depth: usize, subject: String },

    #[error("certificate at depth {depth} has unrecognized critical extension {oid}")]
    UnknownCriticalExtension { depth: usize, oid: String },

    #[error("certificate at depth {depth} name '{name}' violates name constraints")]
    NameConstraintViolation { depth: usize, name: String },
}
