//! Local keystores.
//!
//! Two layouts are read:
//!
//! - `pem`: one file of concatenated PEM certificates.
//! - `dir`: a directory of `.pem`, `.crt`, `.cer` or `.der` files.
//!
//! Aliases come from file names. A file holding one certificate gives the
//! alias `<stem>`; a file holding several gives `<stem>-0`, `<stem>-1`, ...
//! in file order. JKS and PKCS#12 stores are rejected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use trustval_types::{
    AliasPattern, Certificate, FetchError, KeyStoreFormat, KeyStoreHandle, SourceDescriptor,
    TrustAnchorSet,
};

use crate::error::SourceError;
use crate::pem::parse_certificate_file;
use crate::source::TrustAnchorSource;

const CERTIFICATE_EXTENSIONS: &[&str] = &["pem", "crt", "cer", "der"];

/// One aliased certificate.
#[derive(Clone, Debug)]
pub struct KeyStoreEntry {
    pub alias: String,
    pub certificate: Certificate,
}

/// The certificates of a loaded keystore, in a stable order.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    entries: Vec<KeyStoreEntry>,
}

impl KeyStore {
    /// Check that a keystore handle can be loaded at all: the format is
    /// supported and the path exists with the right kind.
    pub fn check(handle: &KeyStoreHandle) -> Result<(), SourceError> {
        if !handle.format.is_supported() {
            return Err(SourceError::UnsupportedKeyStoreFormat(handle.format.as_str()));
        }
        let metadata = std::fs::metadata(&handle.path).map_err(|e| SourceError::KeyStore {
            path: handle.path.clone(),
            reason: e.to_string(),
        })?;
        let kind_ok = match handle.format {
            KeyStoreFormat::Dir => metadata.is_dir(),
            _ => metadata.is_file(),
        };
        if !kind_ok {
            return Err(SourceError::KeyStore {
                path: handle.path.clone(),
                reason: format!("not a {} keystore", handle.format.as_str()),
            });
        }
        Ok(())
    }

    pub async fn load(handle: &KeyStoreHandle) -> Result<Self, FetchError> {
        let mut entries = Vec::new();
        match handle.format {
            KeyStoreFormat::Pem => {
                read_file_entries(&handle.path, &mut entries).await?;
            }
            KeyStoreFormat::Dir => {
                for path in certificate_files(&handle.path).await? {
                    read_file_entries(&path, &mut entries).await?;
                }
            }
            other => {
                return Err(FetchError::KeyStore(format!(
                    "{}: format '{}' is not supported",
                    handle.path.display(),
                    other.as_str()
                )))
            }
        }
        debug!(path = %handle.path.display(), entries = entries.len(), "keystore loaded");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[KeyStoreEntry] {
        &self.entries
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.alias.as_str())
    }

    /// Certificates whose alias matches `pattern`, in keystore order.
    pub fn certificates_matching(&self, pattern: &AliasPattern) -> Vec<Certificate> {
        self.entries
            .iter()
            .filter(|e| pattern.is_match(&e.alias))
            .map(|e| e.certificate.clone())
            .collect()
    }
}

async fn certificate_files(dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| CERTIFICATE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if wanted && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn read_file_entries(path: &Path, out: &mut Vec<KeyStoreEntry>) -> Result<(), FetchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FetchError::KeyStore(format!("{}: {e}", path.display())))?;
    let certs = parse_certificate_file(&bytes)
        .map_err(|e| FetchError::KeyStore(format!("{}: {e}", path.display())))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if certs.len() == 1 {
        out.extend(certs.into_iter().map(|certificate| KeyStoreEntry {
            alias: stem.clone(),
            certificate,
        }));
    } else {
        out.extend(
            certs
                .into_iter()
                .enumerate()
                .map(|(i, certificate)| KeyStoreEntry {
                    alias: format!("{stem}-{i}"),
                    certificate,
                }),
        );
    }
    Ok(())
}

/// Anchors from a keystore, restricted to the selector's alias pattern.
///
/// The keystore is re-read on every fetch; caching is the caller's concern.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyStoreSource;

impl KeyStoreSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrustAnchorSource for KeyStoreSource {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        let SourceDescriptor::KeyStore(selector) = descriptor else {
            return Err(FetchError::Unsupported(descriptor.to_string()));
        };
        let store = KeyStore::load(&selector.keystore).await?;
        let certs = store.certificates_matching(&selector.alias_pattern);
        debug!(
            source = %descriptor,
            matched = certs.len(),
            total = store.entries().len(),
            "keystore anchors selected"
        );
        Ok(TrustAnchorSet::from_certificates(certs))
    }
}
