use thiserror::Error;

use trustval_rpc::RpcError;
use trustval_sources::SourceError;
use trustval_types::{ServiceType, VerificationContext};

/// Configuration problems. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("{field}: {source}")]
    Source {
        field: String,
        #[source]
        source: SourceError,
    },

    #[error("duplicate {kind} use case '{use_case}'")]
    DuplicateUseCase { kind: &'static str, use_case: String },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No configuration found for VerificationContext {0}")]
    UnknownContext(VerificationContext),

    #[error("no trust sources are configured (query for {0})")]
    NoTrustSources(VerificationContext),

    #[error("no certificates configured for service type {0}")]
    UnknownServiceType(ServiceType),
}

impl From<EngineError> for RpcError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownContext(ctx) => RpcError::UnknownContext(ctx.to_string()),
            EngineError::NoTrustSources(ctx) => RpcError::NoTrustSources(ctx.to_string()),
            EngineError::UnknownServiceType(st) => RpcError::UnknownServiceType(st.to_string()),
            other => RpcError::Internal(other.to_string()),
        }
    }
}
