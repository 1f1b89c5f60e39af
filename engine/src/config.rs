//! Validator configuration with TOML file support.
//!
//! Every section has defaults, so an empty file yields a validator that
//! answers nothing but starts cleanly. [`ValidatorConfig::validate`] runs
//! the startup checks that need the filesystem (keystore paths) and the
//! cross-entry checks serde cannot express (unique use cases).

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use trustval_cache::{CacheSettings, StalePolicy};
use trustval_rpc::CorsSettings;
use trustval_sources::KeyStore;
use trustval_types::{
    AliasPattern, KeyStoreFormat, KeyStoreHandle, KeyStoreSelector, Password, ServiceType,
    TrustedListFormat, TrustedListLocator,
};
use trustval_utils::LogFormat;

use crate::ConfigError;

/// Configuration for a trust validator.
///
/// Loaded from a TOML file via [`ValidatorConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Log output format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter (e.g. "info", "debug,trustval_cache=trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cors: CorsSettings,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub trust_sources: TrustSourcesConfig,

    /// Simple-profile sources feeding the mutable trust store.
    #[serde(default)]
    pub service_type_sources: Vec<ServiceTypeSourceConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory for downloaded trusted-list documents.
    #[serde(default = "default_cache_location")]
    pub location: PathBuf,

    #[serde(default = "default_anchor_ttl_secs")]
    pub anchor_ttl_secs: u64,

    #[serde(default = "default_document_ttl_secs")]
    pub document_ttl_secs: u64,

    /// How often the document cache directory is wiped.
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// What a query sees when refreshing an expired anchor set fails.
    #[serde(default)]
    pub on_refresh_failure: StalePolicy,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// OCSP/CRL checking. Not supported; enabling it makes every chain fail.
    #[serde(default)]
    pub revocation_enabled: bool,
}

/// Trust sources per verification context family.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrustSourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_providers: Option<TrustedListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid_providers: Option<TrustedListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qeaa_providers: Option<TrustedListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_eaa_providers: Option<TrustedListConfig>,
    #[serde(default)]
    pub eaa_providers: Vec<UseCaseListConfig>,
    #[serde(default)]
    pub custom_providers: Vec<UseCaseListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrpac_providers: Option<TrustedListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrprc_providers: Option<TrustedListConfig>,
    /// Fallback keystore consulted for every configured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store: Option<KeyStoreConfig>,
}

impl TrustSourcesConfig {
    pub fn is_empty(&self) -> bool {
        self.trusted_lists().next().is_none() && self.key_store.is_none()
    }

    /// Every trusted-list block with its config path, for diagnostics.
    pub fn trusted_lists(&self) -> impl Iterator<Item = (String, &TrustedListConfig)> + '_ {
        let fixed = [
            ("wallet_providers", &self.wallet_providers),
            ("pid_providers", &self.pid_providers),
            ("qeaa_providers", &self.qeaa_providers),
            ("pub_eaa_providers", &self.pub_eaa_providers),
            ("wrpac_providers", &self.wrpac_providers),
            ("wrprc_providers", &self.wrprc_providers),
        ]
        .into_iter()
        .filter_map(|(name, list)| list.as_ref().map(|l| (format!("trust_sources.{name}"), l)));
        let eaa = self.eaa_providers.iter().map(|p| {
            (format!("trust_sources.eaa_providers[{}]", p.use_case), &p.lotl)
        });
        let custom = self.custom_providers.iter().map(|p| {
            (format!("trust_sources.custom_providers[{}]", p.use_case), &p.lotl)
        });
        fixed.chain(eaa).chain(custom)
    }
}

/// A published trusted list and the service types used to filter it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedListConfig {
    pub location: String,
    /// Keystore holding the list's signing certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_verification: Option<KeyStoreConfig>,
    pub issuance_service: String,
    pub revocation_service: String,
    #[serde(default)]
    pub format: TrustedListFormat,
}

impl TrustedListConfig {
    pub fn issuance(&self) -> TrustedListLocator {
        self.locator(&self.issuance_service)
    }

    pub fn revocation(&self) -> TrustedListLocator {
        self.locator(&self.revocation_service)
    }

    fn locator(&self, service_type: &str) -> TrustedListLocator {
        TrustedListLocator {
            location: self.location.clone(),
            signature_keystore: self.signature_verification.as_ref().map(KeyStoreConfig::handle),
            service_type: service_type.to_string(),
            format: self.format,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseListConfig {
    pub use_case: String,
    pub lotl: TrustedListConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    pub location: PathBuf,
    #[serde(default = "default_keystore_type")]
    pub keystore_type: KeyStoreFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Password>,
    #[serde(default)]
    pub alias_pattern: AliasPattern,
}

impl KeyStoreConfig {
    pub fn handle(&self) -> KeyStoreHandle {
        KeyStoreHandle {
            path: self.location.clone(),
            format: self.keystore_type,
            password: self.password.clone(),
        }
    }

    pub fn selector(&self) -> KeyStoreSelector {
        KeyStoreSelector {
            keystore: self.handle(),
            alias_pattern: self.alias_pattern.clone(),
        }
    }

    fn check(&self, field: &str) -> Result<(), ConfigError> {
        KeyStore::check(&self.handle()).map_err(|source| ConfigError::Source {
            field: field.to_string(),
            source,
        })?;
        if self.password.is_some() {
            warn!(field, "keystore password is ignored for {} keystores", self.keystore_type.as_str());
        }
        Ok(())
    }
}

/// One simple-profile source: a trusted list and/or a keystore feeding the
/// certificates for `provider_type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypeSourceConfig {
    pub provider_type: ServiceType,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lotl: Option<ServiceTypeListConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystore: Option<KeyStoreConfig>,
}

impl ServiceTypeSourceConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypeListConfig {
    pub location: String,
    /// Entries to take from the list. Defaults to the provider type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type_filter: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystore: Option<KeyStoreConfig>,
    #[serde(default)]
    pub format: TrustedListFormat,
}

impl ServiceTypeListConfig {
    pub fn locator(&self, provider_type: ServiceType) -> TrustedListLocator {
        TrustedListLocator {
            location: self.location.clone(),
            signature_keystore: self.keystore.as_ref().map(KeyStoreConfig::handle),
            service_type: self.service_type_filter.unwrap_or(provider_type).uri().to_string(),
            format: self.format,
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_location() -> PathBuf {
    std::env::temp_dir().join("trustval").join("dss")
}

fn default_anchor_ttl_secs() -> u64 {
    600
}

fn default_document_ttl_secs() -> u64 {
    86_100
}

fn default_eviction_interval_secs() -> u64 {
    86_100
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_keystore_type() -> KeyStoreFormat {
    KeyStoreFormat::Pem
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            anchor_ttl_secs: default_anchor_ttl_secs(),
            document_ttl_secs: default_document_ttl_secs(),
            eviction_interval_secs: default_eviction_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            on_refresh_failure: StalePolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn anchor_cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl_secs: self.anchor_ttl_secs,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            stale_policy: self.on_refresh_failure,
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ValidatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ValidatorConfig is always serializable to TOML")
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind_address, self.server.port)
    }

    /// Startup checks: keystores exist, intervals are non-zero, use cases
    /// are unique, and simple-profile sources name something to read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.eviction_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.eviction_interval_secs must be greater than zero".into(),
            ));
        }
        if self.cache.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.fetch_timeout_secs must be greater than zero".into(),
            ));
        }

        let sources = &self.trust_sources;
        unique_use_cases("EAA", &sources.eaa_providers)?;
        unique_use_cases("Custom", &sources.custom_providers)?;

        for (field, list) in sources.trusted_lists() {
            if let Some(keystore) = &list.signature_verification {
                keystore.check(&format!("{field}.signature_verification"))?;
            }
        }
        if let Some(keystore) = &sources.key_store {
            keystore.check("trust_sources.key_store")?;
        }

        let mut provider_types = HashSet::new();
        for source in &self.service_type_sources {
            let field = format!("service_type_sources[{}]", source.provider_type);
            if !provider_types.insert(source.provider_type) {
                return Err(ConfigError::Invalid(format!("{field}: configured more than once")));
            }
            if source.lotl.is_none() && source.keystore.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "{field}: at least one of lotl or keystore is required"
                )));
            }
            if source.refresh_interval_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{field}: refresh_interval_secs must be greater than zero"
                )));
            }
            if let Some(keystore) = source.lotl.as_ref().and_then(|l| l.keystore.as_ref()) {
                keystore.check(&format!("{field}.lotl.keystore"))?;
            }
            if let Some(keystore) = &source.keystore {
                keystore.check(&format!("{field}.keystore"))?;
            }
        }
        Ok(())
    }
}

fn unique_use_cases(kind: &'static str, providers: &[UseCaseListConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for provider in providers {
        if provider.use_case.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{kind} use case must not be empty")));
        }
        if !seen.insert(provider.use_case.as_str()) {
            return Err(ConfigError::DuplicateUseCase {
                kind,
                use_case: provider.use_case.clone(),
            });
        }
    }
    Ok(())
}
