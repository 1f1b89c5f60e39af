use std::sync::Arc;

use tracing::debug;

use trustval_pkix::{ChainValidator, ValidationPolicy};
use trustval_types::{CertificateChain, Clock, ServiceType, TrustAnchorSet};

use crate::trust_store::TrustStore;
use crate::EngineError;

/// Chain verification against the simple-profile trust store. Revocation is
/// never checked here.
pub struct VerifyTrust {
    store: Arc<TrustStore>,
    validator: ChainValidator,
    clock: Arc<dyn Clock>,
}

impl VerifyTrust {
    pub fn new(store: Arc<TrustStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            validator: ChainValidator::new(ValidationPolicy {
                revocation_enabled: false,
            }),
            clock,
        }
    }

    pub async fn verify(
        &self,
        service_type: ServiceType,
        chain: &CertificateChain,
    ) -> Result<bool, EngineError> {
        let certificates = self
            .store
            .get(service_type)
            .await
            .filter(|certs| !certs.is_empty())
            .ok_or(EngineError::UnknownServiceType(service_type))?;

        let anchors = TrustAnchorSet::from_certificates(certificates.iter().cloned());
        match self.validator.validate(chain, &anchors, self.clock.now()) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(service_type = %service_type, reason = %e, "chain rejected");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustval_nullables::{pki, TestCert};
    use trustval_types::SystemClock;

    fn verifier(store: &Arc<TrustStore>) -> VerifyTrust {
        VerifyTrust::new(store.clone(), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn chains_under_stored_roots_verify() {
        let store = Arc::new(TrustStore::new());
        let root = TestCert::root("PID Root");
        let leaf = root.leaf("issuer.example");
        store
            .update(ServiceType::PidProvider, vec![root.certificate()])
            .await;

        let verify = verifier(&store);
        assert!(verify
            .verify(ServiceType::PidProvider, &pki::chain(&[&leaf]))
            .await
            .unwrap());

        let stranger = TestCert::root("Other").leaf("other.example");
        assert!(!verify
            .verify(ServiceType::PidProvider, &pki::chain(&[&stranger]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unset_or_empty_service_type_is_unknown() {
        let store = Arc::new(TrustStore::new());
        let leaf = TestCert::root("PID Root").leaf("issuer.example");
        let verify = verifier(&store);
        assert!(matches!(
            verify.verify(ServiceType::QeaaProvider, &pki::chain(&[&leaf])).await,
            Err(EngineError::UnknownServiceType(ServiceType::QeaaProvider))
        ));

        store.update(ServiceType::QeaaProvider, Vec::new()).await;
        assert!(matches!(
            verify.verify(ServiceType::QeaaProvider, &pki::chain(&[&leaf])).await,
            Err(EngineError::UnknownServiceType(_))
        ));
    }
}
