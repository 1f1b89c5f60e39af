//! Request handlers and their wire types.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use trustval_types::{ServiceType, TrustDecision, VerificationContext};

use crate::encoding::{decode_chain, encode_certificate};
use crate::error::RpcError;
use crate::service::TrustQueryService;

pub type SharedService = Arc<dyn TrustQueryService>;

// ── Trust query ──────────────────────────────────────────────────────────

/// Verification context as named on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationContextTO {
    WalletInstanceAttestation,
    WalletUnitAttestation,
    WalletUnitAttestationStatus,
    #[serde(rename = "PID")]
    Pid,
    #[serde(rename = "PIDStatus")]
    PidStatus,
    #[serde(rename = "PubEAA")]
    PubEaa,
    #[serde(rename = "PubEAAStatus")]
    PubEaaStatus,
    #[serde(rename = "QEAA")]
    Qeaa,
    #[serde(rename = "QEAAStatus")]
    QeaaStatus,
    #[serde(rename = "EAA")]
    Eaa,
    #[serde(rename = "EAAStatus")]
    EaaStatus,
    WalletRelyingPartyRegistrationCertificate,
    WalletRelyingPartyAccessCertificate,
    Custom,
}

impl VerificationContextTO {
    /// Combine with the request's `useCase`, which EAA, EAAStatus and Custom
    /// require and every other context ignores.
    pub fn with_use_case(self, use_case: Option<String>) -> Result<VerificationContext, RpcError> {
        let required = || use_case.clone().ok_or(RpcError::MissingUseCase);
        Ok(match self {
            Self::WalletInstanceAttestation => VerificationContext::WalletInstanceAttestation,
            Self::WalletUnitAttestation => VerificationContext::WalletUnitAttestation,
            Self::WalletUnitAttestationStatus => VerificationContext::WalletUnitAttestationStatus,
            Self::Pid => VerificationContext::Pid,
            Self::PidStatus => VerificationContext::PidStatus,
            Self::PubEaa => VerificationContext::PubEaa,
            Self::PubEaaStatus => VerificationContext::PubEaaStatus,
            Self::Qeaa => VerificationContext::Qeaa,
            Self::QeaaStatus => VerificationContext::QeaaStatus,
            Self::Eaa => VerificationContext::Eaa(required()?),
            Self::EaaStatus => VerificationContext::EaaStatus(required()?),
            Self::WalletRelyingPartyRegistrationCertificate => {
                VerificationContext::WalletRelyingPartyRegistrationCertificate
            }
            Self::WalletRelyingPartyAccessCertificate => {
                VerificationContext::WalletRelyingPartyAccessCertificate
            }
            Self::Custom => VerificationContext::Custom(required()?),
        })
    }
}

impl From<&VerificationContext> for VerificationContextTO {
    fn from(context: &VerificationContext) -> Self {
        match context {
            VerificationContext::WalletInstanceAttestation => Self::WalletInstanceAttestation,
            VerificationContext::WalletUnitAttestation => Self::WalletUnitAttestation,
            VerificationContext::WalletUnitAttestationStatus => Self::WalletUnitAttestationStatus,
            VerificationContext::Pid => Self::Pid,
            VerificationContext::PidStatus => Self::PidStatus,
            VerificationContext::PubEaa => Self::PubEaa,
            VerificationContext::PubEaaStatus => Self::PubEaaStatus,
            VerificationContext::Qeaa => Self::Qeaa,
            VerificationContext::QeaaStatus => Self::QeaaStatus,
            VerificationContext::Eaa(_) => Self::Eaa,
            VerificationContext::EaaStatus(_) => Self::EaaStatus,
            VerificationContext::WalletRelyingPartyRegistrationCertificate => {
                Self::WalletRelyingPartyRegistrationCertificate
            }
            VerificationContext::WalletRelyingPartyAccessCertificate => {
                Self::WalletRelyingPartyAccessCertificate
            }
            VerificationContext::Custom(_) => Self::Custom,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustQueryRequest {
    /// Base64 DER certificates, leaf first.
    pub chain: Vec<String>,
    pub verification_context: VerificationContextTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustQueryResponse {
    pub trusted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_anchor: Option<String>,
}

impl From<&TrustDecision> for TrustQueryResponse {
    fn from(decision: &TrustDecision) -> Self {
        Self {
            trusted: decision.is_trusted(),
            trust_anchor: decision.anchor().map(|a| encode_certificate(a.certificate())),
        }
    }
}

pub async fn trust_query(
    State(service): State<SharedService>,
    body: Bytes,
) -> Result<Json<TrustQueryResponse>, RpcError> {
    let request: TrustQueryRequest = parse_body(&body)?;
    let context = request
        .verification_context
        .with_use_case(request.use_case)?;
    let chain = decode_chain(&request.chain)?;

    let decision = service.is_chain_trusted(chain, context.clone()).await?;
    debug!(context = %context, trusted = decision.is_trusted(), "trust query answered");
    Ok(Json(TrustQueryResponse::from(&decision)))
}

// ── Service-type query ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeQueryRequest {
    pub x5c: Vec<String>,
    /// Service-type name (`PIDProvider`) or URI.
    pub service_type: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypeQueryResponse {
    pub trusted: bool,
}

pub async fn service_type_query(
    State(service): State<SharedService>,
    body: Bytes,
) -> Result<Json<ServiceTypeQueryResponse>, RpcError> {
    let request: ServiceTypeQueryRequest = parse_body(&body)?;
    let service_type: ServiceType = request
        .service_type
        .parse()
        .map_err(|_| RpcError::UnknownServiceType(request.service_type.clone()))?;
    let chain = decode_chain(&request.x5c)?;

    let trusted = service.verify_service_type(chain, service_type).await?;
    debug!(service_type = %service_type, trusted, "service-type query answered");
    Ok(Json(ServiceTypeQueryResponse { trusted }))
}

// ── Health and metrics ───────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics(State(service): State<SharedService>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        service.render_metrics(),
    )
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(body).map_err(|e| RpcError::UnparseableBody(e.to_string()))
}
