//! Maps verification contexts to the trust sources that answer them.
//!
//! Built once from configuration. Each trusted-list block registers an
//! issuance descriptor (and usually a revocation-status descriptor) under a
//! fixed pair of contexts; the optional keystore registers under every
//! context a trusted list does.

use std::collections::HashMap;

use tracing::info;

use trustval_types::{SourceDescriptor, VerificationContext};

use crate::config::{TrustSourcesConfig, TrustedListConfig};

/// Which of a context's two possible sources a strategy consults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    TrustedList,
    KeyStore,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrustedList => "trusted list",
            Self::KeyStore => "keystore",
        }
    }
}

/// The sources registered for one context. At least one is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Routes<'a> {
    pub trusted_list: Option<&'a SourceDescriptor>,
    pub key_store: Option<&'a SourceDescriptor>,
}

impl<'a> Routes<'a> {
    pub fn get(&self, kind: SourceKind) -> Option<&'a SourceDescriptor> {
        match kind {
            SourceKind::TrustedList => self.trusted_list,
            SourceKind::KeyStore => self.key_store,
        }
    }

    /// Trusted list first.
    pub fn descriptors(&self) -> Vec<&'a SourceDescriptor> {
        self.trusted_list.into_iter().chain(self.key_store).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContextRouter {
    trusted_lists: HashMap<VerificationContext, SourceDescriptor>,
    key_stores: HashMap<VerificationContext, SourceDescriptor>,
}

impl ContextRouter {
    pub fn from_config(config: &TrustSourcesConfig) -> Self {
        let mut router = Self::default();

        if let Some(list) = &config.wallet_providers {
            router.register_issuance(list, VerificationContext::WalletInstanceAttestation);
            router.register_issuance(list, VerificationContext::WalletUnitAttestation);
            router.register_revocation(list, VerificationContext::WalletUnitAttestationStatus);
        }
        if let Some(list) = &config.pid_providers {
            router.register_pair(list, VerificationContext::Pid, VerificationContext::PidStatus);
        }
        if let Some(list) = &config.qeaa_providers {
            router.register_pair(list, VerificationContext::Qeaa, VerificationContext::QeaaStatus);
        }
        if let Some(list) = &config.pub_eaa_providers {
            router.register_pair(
                list,
                VerificationContext::PubEaa,
                VerificationContext::PubEaaStatus,
            );
        }
        for provider in &config.eaa_providers {
            router.register_pair(
                &provider.lotl,
                VerificationContext::Eaa(provider.use_case.clone()),
                VerificationContext::EaaStatus(provider.use_case.clone()),
            );
        }
        if let Some(list) = &config.wrpac_providers {
            router.register_issuance(list, VerificationContext::WalletRelyingPartyAccessCertificate);
        }
        if let Some(list) = &config.wrprc_providers {
            router.register_issuance(
                list,
                VerificationContext::WalletRelyingPartyRegistrationCertificate,
            );
        }

        if let Some(keystore) = &config.key_store {
            let descriptor = SourceDescriptor::KeyStore(keystore.selector());
            let mut contexts = vec![
                VerificationContext::WalletInstanceAttestation,
                VerificationContext::WalletUnitAttestation,
                VerificationContext::WalletUnitAttestationStatus,
                VerificationContext::Pid,
                VerificationContext::PidStatus,
                VerificationContext::Qeaa,
                VerificationContext::QeaaStatus,
                VerificationContext::PubEaa,
                VerificationContext::PubEaaStatus,
                VerificationContext::WalletRelyingPartyAccessCertificate,
                VerificationContext::WalletRelyingPartyRegistrationCertificate,
            ];
            for provider in &config.eaa_providers {
                contexts.push(VerificationContext::Eaa(provider.use_case.clone()));
                contexts.push(VerificationContext::EaaStatus(provider.use_case.clone()));
            }
            for context in contexts {
                router.register(SourceKind::KeyStore, context, descriptor.clone());
            }
        }

        // Custom contexts are reachable only through their own list.
        for provider in &config.custom_providers {
            router.register_issuance(
                &provider.lotl,
                VerificationContext::Custom(provider.use_case.clone()),
            );
        }

        router
    }

    pub fn register(
        &mut self,
        kind: SourceKind,
        context: VerificationContext,
        descriptor: SourceDescriptor,
    ) {
        info!("Configured VerificationContext {context} using {descriptor}");
        let table = match kind {
            SourceKind::TrustedList => &mut self.trusted_lists,
            SourceKind::KeyStore => &mut self.key_stores,
        };
        table.insert(context, descriptor);
    }

    fn register_issuance(&mut self, list: &TrustedListConfig, context: VerificationContext) {
        let descriptor = SourceDescriptor::TrustedList(list.issuance());
        self.register(SourceKind::TrustedList, context, descriptor);
    }

    fn register_revocation(&mut self, list: &TrustedListConfig, context: VerificationContext) {
        let descriptor = SourceDescriptor::TrustedList(list.revocation());
        self.register(SourceKind::TrustedList, context, descriptor);
    }

    fn register_pair(
        &mut self,
        list: &TrustedListConfig,
        issuance: VerificationContext,
        revocation: VerificationContext,
    ) {
        self.register_issuance(list, issuance);
        self.register_revocation(list, revocation);
    }

    /// The sources for `context`, or `None` when nothing is configured for
    /// it.
    pub fn routes_for(&self, context: &VerificationContext) -> Option<Routes<'_>> {
        let routes = Routes {
            trusted_list: self.trusted_lists.get(context),
            key_store: self.key_stores.get(context),
        };
        (routes.trusted_list.is_some() || routes.key_store.is_some()).then_some(routes)
    }

    pub fn is_empty(&self) -> bool {
        self.trusted_lists.is_empty() && self.key_stores.is_empty()
    }

    /// Every configured context, in no particular order.
    pub fn contexts(&self) -> impl Iterator<Item = &VerificationContext> + '_ {
        self.trusted_lists
            .keys()
            .chain(self.key_stores.keys().filter(|c| !self.trusted_lists.contains_key(*c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyStoreConfig, UseCaseListConfig};
    use trustval_types::{AliasPattern, KeyStoreFormat};

    fn list(location: &str) -> TrustedListConfig {
        TrustedListConfig {
            location: location.into(),
            signature_verification: None,
            issuance_service: format!("{location}#issuance"),
            revocation_service: format!("{location}#revocation"),
            format: Default::default(),
        }
    }

    fn keystore() -> KeyStoreConfig {
        KeyStoreConfig {
            location: "/etc/trust/roots.pem".into(),
            keystore_type: KeyStoreFormat::Pem,
            password: None,
            alias_pattern: AliasPattern::default(),
        }
    }

    fn config() -> TrustSourcesConfig {
        TrustSourcesConfig {
            wallet_providers: Some(list("wallet")),
            pid_providers: Some(list("pid")),
            eaa_providers: vec![UseCaseListConfig {
                use_case: "mdl".into(),
                lotl: list("mdl"),
            }],
            custom_providers: vec![UseCaseListConfig {
                use_case: "loyalty".into(),
                lotl: list("loyalty"),
            }],
            wrpac_providers: Some(list("wrpac")),
            key_store: Some(keystore()),
            ..Default::default()
        }
    }

    fn service_type(descriptor: &SourceDescriptor) -> &str {
        match descriptor {
            SourceDescriptor::TrustedList(l) => &l.service_type,
            SourceDescriptor::KeyStore(_) => panic!("expected a trusted list"),
        }
    }

    #[test]
    fn issuance_and_status_contexts_use_matching_services() {
        let router = ContextRouter::from_config(&config());
        let list = |context| {
            router
                .routes_for(&context)
                .and_then(|routes| routes.trusted_list)
                .unwrap()
        };
        let pid = list(VerificationContext::Pid);
        let status = list(VerificationContext::PidStatus);
        assert_eq!(service_type(pid), "pid#issuance");
        assert_eq!(service_type(status), "pid#revocation");

        let wua = list(VerificationContext::WalletUnitAttestation);
        let wua_status = list(VerificationContext::WalletUnitAttestationStatus);
        assert_eq!(service_type(wua), "wallet#issuance");
        assert_eq!(service_type(wua_status), "wallet#revocation");
    }

    #[test]
    fn keystore_backs_every_context_but_custom() {
        let router = ContextRouter::from_config(&config());
        for context in [
            VerificationContext::Pid,
            VerificationContext::Qeaa,
            VerificationContext::EaaStatus("mdl".into()),
            VerificationContext::WalletRelyingPartyRegistrationCertificate,
        ] {
            let routes = router.routes_for(&context).unwrap();
            assert!(routes.get(SourceKind::KeyStore).is_some(), "{context}");
        }
        let custom = router
            .routes_for(&VerificationContext::Custom("loyalty".into()))
            .unwrap();
        assert!(custom.trusted_list.is_some());
        assert!(custom.get(SourceKind::KeyStore).is_none());
    }

    #[test]
    fn trusted_list_comes_first() {
        let router = ContextRouter::from_config(&config());
        let pid = router.routes_for(&VerificationContext::Pid).unwrap();
        match pid.descriptors()[..] {
            [primary, secondary] => {
                assert!(matches!(primary, SourceDescriptor::TrustedList(_)));
                assert!(matches!(secondary, SourceDescriptor::KeyStore(_)));
            }
            ref other => panic!("unexpected routes {other:?}"),
        }
        // QEAA has no list of its own, only the keystore.
        let qeaa = router.routes_for(&VerificationContext::Qeaa).unwrap();
        assert!(qeaa.trusted_list.is_none());
        assert!(matches!(qeaa.descriptors()[..], [SourceDescriptor::KeyStore(_)]));
    }

    #[test]
    fn unconfigured_contexts_have_no_routes() {
        let router = ContextRouter::from_config(&config());
        assert!(router.routes_for(&VerificationContext::Eaa("unknown".into())).is_none());
        assert!(router.routes_for(&VerificationContext::Custom("unknown".into())).is_none());

        let empty = ContextRouter::from_config(&TrustSourcesConfig::default());
        assert!(empty.is_empty());
        assert!(empty.routes_for(&VerificationContext::Pid).is_none());
    }

    #[test]
    fn routes_are_stable_across_lookups() {
        let router = ContextRouter::from_config(&config());
        for context in router.contexts().cloned().collect::<Vec<_>>() {
            let first = router.routes_for(&context).map(|r| r.descriptors());
            let second = router.routes_for(&context).map(|r| r.descriptors());
            assert_eq!(first, second);
            assert!(first.is_some());
        }
        // Building twice from the same config yields equal routes.
        let again = ContextRouter::from_config(&config());
        assert_eq!(
            router.routes_for(&VerificationContext::Pid),
            again.routes_for(&VerificationContext::Pid)
        );
    }
}
