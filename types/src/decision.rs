//! The terminal outcome of a trust query.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::TrustAnchor;

pub type DecisionCause = Arc<dyn Error + Send + Sync>;

/// Whether a chain is trusted, and by which anchor.
#[derive(Clone)]
pub enum TrustDecision {
    Trusted(TrustAnchor),
    NotTrusted(Option<DecisionCause>),
}

impl TrustDecision {
    pub fn not_trusted<E>(cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::NotTrusted(Some(Arc::new(cause)))
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted(_))
    }

    pub fn anchor(&self) -> Option<&TrustAnchor> {
        match self {
            Self::Trusted(a) => Some(a),
            Self::NotTrusted(_) => None,
        }
    }

    pub fn cause(&self) -> Option<&DecisionCause> {
        match self {
            Self::Trusted(_) => None,
            Self::NotTrusted(c) => c.as_ref(),
        }
    }
}

impl fmt::Debug for TrustDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted(a) => f.debug_tuple("Trusted").field(a.certificate()).finish(),
            Self::NotTrusted(Some(c)) => write!(f, "NotTrusted({c})"),
            Self::NotTrusted(None) => f.write_str("NotTrusted"),
        }
    }
}
