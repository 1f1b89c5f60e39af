//! Source descriptors: where a set of trust anchors comes from.
//!
//! A descriptor is the TTL-cache key, so every type reachable from it is
//! comparable and hashable. Descriptors are built once from configuration and
//! never change afterwards.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::TypesError;

/// A keystore or trusted-list password. Never printed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(REDACTED)")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("REDACTED")
    }
}

/// On-disk layout of a keystore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreFormat {
    /// A single file of concatenated PEM certificates.
    Pem,
    /// A directory of PEM or DER certificate files.
    Dir,
    Jks,
    Pkcs12,
}

impl KeyStoreFormat {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Pem | Self::Dir)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pem => "pem",
            Self::Dir => "dir",
            Self::Jks => "jks",
            Self::Pkcs12 => "pkcs12",
        }
    }
}

/// Encoding of a published trusted-list document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustedListFormat {
    /// Concatenated PEM certificates.
    #[default]
    PemBundle,
}

/// A local keystore.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyStoreHandle {
    pub path: PathBuf,
    pub format: KeyStoreFormat,
    pub password: Option<Password>,
}

/// Regex over keystore aliases. Compared by its source text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AliasPattern(Regex);

impl AliasPattern {
    pub const MATCH_ALL: &'static str = "^.*$";

    pub fn new(pattern: &str) -> Result<Self, TypesError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| TypesError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn is_match(&self, alias: &str) -> bool {
        self.0.is_match(alias)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for AliasPattern {
    fn default() -> Self {
        Self(Regex::new(Self::MATCH_ALL).expect("match-all pattern is valid"))
    }
}

impl PartialEq for AliasPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AliasPattern {}

impl Hash for AliasPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<String> for AliasPattern {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<AliasPattern> for String {
    fn from(p: AliasPattern) -> Self {
        p.as_str().to_string()
    }
}

/// A keystore plus the aliases to take anchors from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyStoreSelector {
    pub keystore: KeyStoreHandle,
    pub alias_pattern: AliasPattern,
}

/// A remotely published trusted list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrustedListLocator {
    pub location: String,
    pub signature_keystore: Option<KeyStoreHandle>,
    /// Service-type URI used to filter the list's entries.
    pub service_type: String,
    pub format: TrustedListFormat,
}

/// Identifies where a trust-anchor set is fetched from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceDescriptor {
    TrustedList(TrustedListLocator),
    KeyStore(KeyStoreSelector),
}

impl SourceDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TrustedList(_) => "trusted list",
            Self::KeyStore(_) => "keystore",
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrustedList(l) => write!(f, "trusted list {} [{}]", l.location, l.service_type),
            Self::KeyStore(k) => write!(
                f,
                "keystore {} [{}]",
                k.keystore.path.display(),
                k.alias_pattern.as_str()
            ),
        }
    }
}
