//! Verification contexts and service types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// What a certificate chain is being verified for.
///
/// The closed variants name fixed attestation/credential categories; `Eaa`,
/// `EaaStatus` and `Custom` carry an open use-case tag that takes part in
/// equality and hashing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VerificationContext {
    WalletInstanceAttestation,
    WalletUnitAttestation,
    WalletUnitAttestationStatus,
    Pid,
    PidStatus,
    PubEaa,
    PubEaaStatus,
    Qeaa,
    QeaaStatus,
    Eaa(String),
    EaaStatus(String),
    WalletRelyingPartyRegistrationCertificate,
    WalletRelyingPartyAccessCertificate,
    Custom(String),
}

impl VerificationContext {
    /// Wire name of the context kind, without any use-case tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WalletInstanceAttestation => "WalletInstanceAttestation",
            Self::WalletUnitAttestation => "WalletUnitAttestation",
            Self::WalletUnitAttestationStatus => "WalletUnitAttestationStatus",
            Self::Pid => "PID",
            Self::PidStatus => "PIDStatus",
            Self::PubEaa => "PubEAA",
            Self::PubEaaStatus => "PubEAAStatus",
            Self::Qeaa => "QEAA",
            Self::QeaaStatus => "QEAAStatus",
            Self::Eaa(_) => "EAA",
            Self::EaaStatus(_) => "EAAStatus",
            Self::WalletRelyingPartyRegistrationCertificate => {
                "WalletRelyingPartyRegistrationCertificate"
            }
            Self::WalletRelyingPartyAccessCertificate => "WalletRelyingPartyAccessCertificate",
            Self::Custom(_) => "Custom",
        }
    }

    /// The open use-case tag, if this context carries one.
    pub fn use_case(&self) -> Option<&str> {
        match self {
            Self::Eaa(u) | Self::EaaStatus(u) | Self::Custom(u) => Some(u),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.use_case() {
            Some(u) => write!(f, "{}({})", self.kind(), u),
            None => f.write_str(self.kind()),
        }
    }
}

/// Service types of the simple deployment profile, each identified by an
/// ETSI service-type URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceType {
    PidProvider,
    QeaaProvider,
    PubEaaProvider,
    WalletProvider,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        Self::PidProvider,
        Self::QeaaProvider,
        Self::PubEaaProvider,
        Self::WalletProvider,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PidProvider => "PIDProvider",
            Self::QeaaProvider => "QEAAProvider",
            Self::PubEaaProvider => "PubEAAProvider",
            Self::WalletProvider => "WalletProvider",
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::PidProvider => "http://uri.etsi.org/Svc/Svctype/Provider/PID",
            Self::QeaaProvider => "http://uri.etsi.org/TrstSvc/Svctype/EAA/Q",
            Self::PubEaaProvider => "http://uri.etsi.org/TrstSvc/Svctype/EAA/Pub-EAA",
            Self::WalletProvider => "http://uri.etsi.org/TrstSvc/Svctype/Provider/Wallet",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceType {
    type Err = TypesError;

    /// Accepts either the variant name or the service-type URI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s || t.uri() == s)
            .ok_or_else(|| TypesError::UnknownServiceType(s.to_string()))
    }
}

impl TryFrom<String> for ServiceType {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ServiceType> for String {
    fn from(t: ServiceType) -> Self {
        t.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn use_case_tag_takes_part_in_equality() {
        let a = VerificationContext::Eaa("mdl".into());
        let b = VerificationContext::Eaa("mdl".into());
        let c = VerificationContext::Eaa("diploma".into());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, VerificationContext::EaaStatus("mdl".into()));

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_includes_use_case() {
        assert_eq!(VerificationContext::Pid.to_string(), "PID");
        assert_eq!(
            VerificationContext::Custom("x".into()).to_string(),
            "Custom(x)"
        );
    }

    #[test]
    fn service_type_parses_by_name_and_uri() {
        assert_eq!(
            "PIDProvider".parse::<ServiceType>().unwrap(),
            ServiceType::PidProvider
        );
        assert_eq!(
            "http://uri.etsi.org/TrstSvc/Svctype/EAA/Q"
                .parse::<ServiceType>()
                .unwrap(),
            ServiceType::QeaaProvider
        );
        assert!(matches!(
            "Nope".parse::<ServiceType>(),
            Err(TypesError::UnknownServiceType(_))
        ));
    }
}
