//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Request body cannot be parsed: {0}")]
    UnparseableBody(String),

    #[error("Missing useCase")]
    MissingUseCase,

    #[error("invalid certificate chain: {0}")]
    InvalidChain(String),

    /// No trust source is configured for the query's context.
    #[error("No configuration found for VerificationContext {0}")]
    UnknownContext(String),

    #[error("Service type provided does not exist")]
    UnknownServiceType(String),

    /// Nothing at all is configured to answer the query.
    #[error("No configuration found for VerificationContext {0}")]
    NoTrustSources(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub description: String,
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnparseableBody(_)
            | Self::MissingUseCase
            | Self::InvalidChain(_)
            | Self::UnknownContext(_)
            | Self::UnknownServiceType(_) => StatusCode::BAD_REQUEST,
            Self::NoTrustSources(_) | Self::Internal(_) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let error = match self {
            Self::UnknownServiceType(_) => Some("Unknown service type"),
            _ => None,
        };
        ErrorBody {
            error,
            description: self.to_string(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "trust query failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "trust query rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_requests() {
        assert_eq!(RpcError::MissingUseCase.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RpcError::UnknownContext("PID".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::NoTrustSources("PID".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_service_type_names_the_error() {
        let body = serde_json::to_value(RpcError::UnknownServiceType("X".into()).body()).unwrap();
        assert_eq!(body["error"], "Unknown service type");
        assert_eq!(body["description"], "Service type provided does not exist");

        let body = serde_json::to_value(RpcError::MissingUseCase.body()).unwrap();
        assert!(body.get("error").is_none());
        assert_eq!(body["description"], "Missing useCase");
    }
}
